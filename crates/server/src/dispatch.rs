//! Command dispatch
//!
//! Takes one decoded command tuple `[op, arg1, ...]`, checks arity,
//! coerces numeric arguments, invokes the engine and renders the result
//! in the wire format. Engine failures become `ERR <message>` strings
//! here; nothing below this layer ever writes to the connection.
//!
//! Arity mistakes fall through to `ERR unknown command`, the same
//! answer an unrecognised op gets.

use shoal_core::{Error, Result};
use shoal_engine::Store;

/// Dispatch one command tuple and render the response string
pub fn apply(store: &Store, argv: &[String]) -> String {
    if argv.is_empty() {
        return "ERR unknown command".to_string();
    }
    match run(store, argv) {
        Ok(response) => response,
        Err(err) => format!("ERR {err}"),
    }
}

fn run(store: &Store, argv: &[String]) -> Result<String> {
    let op = argv[0].to_ascii_uppercase();
    Ok(match (op.as_str(), argv.len()) {
        // ========== Strings ==========
        // The value is every trailing token re-joined with single
        // spaces; original whitespace is not preserved.
        ("SET", n) if n >= 3 => {
            store.set(&argv[1], &argv[2..].join(" "))?;
            "OK".to_string()
        }
        ("GET", 2) => match store.get(&argv[1]) {
            Some(value) => value,
            None => nil(),
        },
        ("DEL", 2) => {
            // Legacy rendering: OK/NULL rather than an integer
            if store.delete(&argv[1])? {
                "OK".to_string()
            } else {
                "NULL".to_string()
            }
        }
        ("TYPE", 2) => match store.type_of(&argv[1]) {
            Some(tag) => tag.as_str().to_string(),
            None => "NULL".to_string(),
        },

        // ========== Lists ==========
        ("LPUSH", n) if n >= 3 => integer(store.lpush(&argv[1], &argv[2..])?),
        ("RPUSH", n) if n >= 3 => integer(store.rpush(&argv[1], &argv[2..])?),
        ("LPOP", 2) => element(store.lpop(&argv[1])?),
        ("RPOP", 2) => element(store.rpop(&argv[1])?),
        ("LRANGE", 4) => {
            let start = parse_int(&argv[2])?;
            let stop = parse_int(&argv[3])?;
            let items = store.lrange(&argv[1], start, stop)?;
            if items.is_empty() {
                "(EMPTY LIST)".to_string()
            } else {
                numbered(items.iter())
            }
        }
        ("LLEN", 2) => integer(store.llen(&argv[1])?),

        // ========== Hashes ==========
        ("HSET", n) if n >= 4 && n % 2 == 0 => {
            let pairs: Vec<(String, String)> = argv[2..]
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            integer(store.hset(&argv[1], &pairs)?)
        }
        ("HGET", 3) => element(store.hget(&argv[1], &argv[2])?),
        ("HMGET", n) if n >= 3 => {
            let values = store.hmget(&argv[1], &argv[2..])?;
            numbered(values.iter().map(|v| v.as_deref().unwrap_or("(nil)")))
        }
        ("HGETALL", 2) => {
            let entries = store.hgetall(&argv[1])?;
            if entries.is_empty() {
                "(empty hash)".to_string()
            } else {
                numbered(entries.iter().map(|(field, value)| format!("{field}: {value}")))
            }
        }
        ("HDEL", n) if n >= 3 => integer(store.hdel(&argv[1], &argv[2..])?),
        ("HLEN", 2) => integer(store.hlen(&argv[1])?),
        ("HEXISTS", 3) => bool_text(store.hexists(&argv[1], &argv[2])?),

        // ========== Sets ==========
        ("SADD", n) if n >= 3 => integer(store.sadd(&argv[1], &argv[2..])?),
        ("SREM", n) if n >= 3 => integer(store.srem(&argv[1], &argv[2..])?),
        ("SISMEMBER", 3) => bool_text(store.sismember(&argv[1], &argv[2])?),
        ("SMISMEMBER", n) if n >= 3 => {
            let hits = store.smismember(&argv[1], &argv[2..])?;
            numbered(hits.iter().map(|hit| bool_text(*hit)))
        }
        ("SMEMBERS", 2) => {
            let members = store.smembers(&argv[1])?;
            if members.is_empty() {
                "(empty set)".to_string()
            } else {
                numbered(members.iter())
            }
        }
        ("SCARD", 2) => integer(store.scard(&argv[1])?),
        ("SRANDMEMBER", 2) => element(store.srandmember(&argv[1])?),
        ("SRANDMEMBER", 3) => {
            let count = parse_int(&argv[2])?;
            let members = store.srandmember_count(&argv[1], count)?;
            if members.is_empty() {
                "(empty set)".to_string()
            } else {
                numbered(members.iter())
            }
        }
        ("SPOP", 2) => element(store.spop(&argv[1])?),

        _ => "ERR unknown command".to_string(),
    })
}

// ========== Response rendering ==========

fn integer(n: usize) -> String {
    format!("(integer) {n}")
}

fn nil() -> String {
    "(nil)".to_string()
}

fn element(value: Option<String>) -> String {
    value.unwrap_or_else(nil)
}

fn bool_text(value: bool) -> String {
    format!("(bool) {}", if value { "True" } else { "False" })
}

/// 1-indexed `i) item` lines joined by newlines
fn numbered<I>(items: I) -> String
where
    I: Iterator,
    I::Item: std::fmt::Display,
{
    items
        .enumerate()
        .map(|(i, item)| format!("{}) {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_int(token: &str) -> Result<i64> {
    token
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("expected an integer, got '{token}'")))
}
