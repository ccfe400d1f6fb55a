//! SpinDBoard contract ABI and return-value decoding.
//!
//! The ABI covers only what the harness calls plus the events, which are
//! listed so the embedded interface matches the deployed contract.
//! `getCurrentGame` returns six flat values while `getGame` returns the full
//! eight-field struct; both decode into [`Round`].

use web3::contract::tokens::Detokenize;
use web3::contract::Error;
use web3::ethabi::Token;
use web3::types::{Address, U256};

use crate::types::{PlayerEntry, PlayerRow, Round, RoundStatus};

pub const SPINDBOARD_ABI: &str = r#"[
  {"type":"function","name":"ENTRY_FEE","stateMutability":"view","inputs":[],
   "outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"joinGame","stateMutability":"payable","inputs":[],"outputs":[]},
  {"type":"function","name":"spin","stateMutability":"nonpayable","inputs":[],"outputs":[]},
  {"type":"function","name":"getCurrentGame","stateMutability":"view","inputs":[],
   "outputs":[
     {"name":"gameId","type":"uint256"},
     {"name":"status","type":"uint8"},
     {"name":"totalPool","type":"uint256"},
     {"name":"playerCount","type":"uint256"},
     {"name":"winner","type":"address"},
     {"name":"winningNumber","type":"uint256"}
   ]},
  {"type":"function","name":"getGame","stateMutability":"view",
   "inputs":[{"name":"gameId","type":"uint256"}],
   "outputs":[{"name":"","type":"tuple","components":[
     {"name":"gameId","type":"uint256"},
     {"name":"status","type":"uint8"},
     {"name":"totalPool","type":"uint256"},
     {"name":"playerCount","type":"uint256"},
     {"name":"winner","type":"address"},
     {"name":"winningNumber","type":"uint256"},
     {"name":"createdAt","type":"uint256"},
     {"name":"completedAt","type":"uint256"}
   ]}]},
  {"type":"function","name":"getPlayerInfo","stateMutability":"view",
   "inputs":[{"name":"player","type":"address"}],
   "outputs":[
     {"name":"hasJoined","type":"bool"},
     {"name":"spinResult","type":"uint256"},
     {"name":"hasSpun","type":"bool"}
   ]},
  {"type":"function","name":"getGamePlayers","stateMutability":"view",
   "inputs":[{"name":"gameId","type":"uint256"}],
   "outputs":[{"name":"","type":"tuple[]","components":[
     {"name":"playerAddress","type":"address"},
     {"name":"spinResult","type":"uint256"},
     {"name":"hasSpun","type":"bool"}
   ]}]},
  {"type":"event","name":"PlayerJoined","anonymous":false,"inputs":[
     {"name":"gameId","type":"uint256","indexed":true},
     {"name":"player","type":"address","indexed":true},
     {"name":"playerCount","type":"uint256","indexed":false}
  ]},
  {"type":"event","name":"PlayerSpun","anonymous":false,"inputs":[
     {"name":"gameId","type":"uint256","indexed":true},
     {"name":"player","type":"address","indexed":true},
     {"name":"spinResult","type":"uint256","indexed":false}
  ]},
  {"type":"event","name":"GameCompleted","anonymous":false,"inputs":[
     {"name":"gameId","type":"uint256","indexed":true},
     {"name":"winner","type":"address","indexed":true},
     {"name":"winningNumber","type":"uint256","indexed":false},
     {"name":"prize","type":"uint256","indexed":false}
  ]}
]"#;

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

fn invalid(msg: String) -> Error {
    Error::InvalidOutputType(msg)
}

fn uint(token: &Token, field: &str) -> Result<U256, Error> {
    token
        .clone()
        .into_uint()
        .ok_or_else(|| invalid(format!("{field}: expected uint, got {token:?}")))
}

fn small_uint(token: &Token, field: &str) -> Result<u64, Error> {
    let value = uint(token, field)?;
    if value > U256::from(u64::MAX) {
        return Err(invalid(format!("{field}: {value} does not fit in u64")));
    }
    Ok(value.as_u64())
}

fn address(token: &Token, field: &str) -> Result<Address, Error> {
    token
        .clone()
        .into_address()
        .ok_or_else(|| invalid(format!("{field}: expected address, got {token:?}")))
}

fn boolean(token: &Token, field: &str) -> Result<bool, Error> {
    token
        .clone()
        .into_bool()
        .ok_or_else(|| invalid(format!("{field}: expected bool, got {token:?}")))
}

/// Unwrap a single tuple/array token, or pass flat outputs through.
fn fields(tokens: Vec<Token>) -> Vec<Token> {
    match tokens.as_slice() {
        [Token::Tuple(inner)] => inner.clone(),
        _ => tokens,
    }
}

fn decode_round(tokens: &[Token]) -> Result<Round, Error> {
    if tokens.len() != 6 && tokens.len() != 8 {
        return Err(invalid(format!(
            "game: expected 6 or 8 fields, got {}: {tokens:?}",
            tokens.len()
        )));
    }
    let (created_at, completed_at) = if tokens.len() == 8 {
        (
            Some(small_uint(&tokens[6], "createdAt")?),
            Some(small_uint(&tokens[7], "completedAt")?),
        )
    } else {
        (None, None)
    };

    Ok(Round {
        id: small_uint(&tokens[0], "gameId")?,
        status: RoundStatus::from_raw(small_uint(&tokens[1], "status")?),
        total_pool: uint(&tokens[2], "totalPool")?,
        player_count: small_uint(&tokens[3], "playerCount")?,
        winner: address(&tokens[4], "winner")?,
        winning_outcome: uint(&tokens[5], "winningNumber")?,
        created_at,
        completed_at,
    })
}

fn decode_player_row(token: &Token) -> Result<PlayerRow, Error> {
    match token {
        Token::Tuple(inner) if inner.len() == 3 => Ok(PlayerRow {
            address: address(&inner[0], "playerAddress")?,
            entry: PlayerEntry::new(
                true,
                boolean(&inner[2], "hasSpun")?,
                uint(&inner[1], "spinResult")?,
            ),
        }),
        other => Err(invalid(format!("player: expected 3-field tuple, got {other:?}"))),
    }
}

// ---------------------------------------------------------------------------
// Decoded return values
// ---------------------------------------------------------------------------

/// `getCurrentGame` / `getGame` output.
#[derive(Debug)]
pub struct GameOutput(pub Round);

impl Detokenize for GameOutput {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
        decode_round(&fields(tokens)).map(GameOutput)
    }
}

/// `getPlayerInfo` output: `(hasJoined, spinResult, hasSpun)`.
#[derive(Debug)]
pub struct PlayerInfoOutput(pub PlayerEntry);

impl Detokenize for PlayerInfoOutput {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
        let tokens = fields(tokens);
        if tokens.len() != 3 {
            return Err(invalid(format!(
                "getPlayerInfo: expected 3 values, got {}: {tokens:?}",
                tokens.len()
            )));
        }
        Ok(PlayerInfoOutput(PlayerEntry::new(
            boolean(&tokens[0], "hasJoined")?,
            boolean(&tokens[2], "hasSpun")?,
            uint(&tokens[1], "spinResult")?,
        )))
    }
}

/// `getGamePlayers` output.
#[derive(Debug)]
pub struct GamePlayersOutput(pub Vec<PlayerRow>);

impl Detokenize for GamePlayersOutput {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
        match tokens.as_slice() {
            [Token::Array(rows)] => rows
                .iter()
                .map(decode_player_row)
                .collect::<Result<Vec<_>, _>>()
                .map(GamePlayersOutput),
            other => Err(invalid(format!(
                "getGamePlayers: expected a single array, got {other:?}"
            ))),
        }
    }
}
