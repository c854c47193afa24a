use crate::options::{ClientOpts, ReplicaOpts};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes the options of a replica into the bytes handed to the worker that starts it
///
/// # [Errors]
/// Fails if the options cannot be encoded
pub fn encode_replica_opts(opts: &ReplicaOpts) -> anyhow::Result<Vec<u8>> {
    encode(opts).with_context(|| format!("Failed to encode the options of replica {}", opts.id()))
}

/// # [Errors]
/// Fails if `bytes` do not hold replica options
pub fn decode_replica_opts(bytes: &[u8]) -> anyhow::Result<ReplicaOpts> {
    decode(bytes).context("Failed to decode replica options")
}

/// # [Errors]
/// Fails if the options cannot be encoded
pub fn encode_client_opts(opts: &ClientOpts) -> anyhow::Result<Vec<u8>> {
    encode(opts).context("Failed to encode client options")
}

/// # [Errors]
/// Fails if `bytes` do not hold client options
pub fn decode_client_opts(bytes: &[u8]) -> anyhow::Result<ClientOpts> {
    decode(bytes).context("Failed to decode client options")
}

fn encode<T>(value: &T) -> Result<Vec<u8>, bincode::error::EncodeError>
where
    T: Serialize,
{
    bincode::serde::encode_to_vec(value, bincode::config::standard())
}

fn decode<T>(bytes: &[u8]) -> Result<T, bincode::error::DecodeError>
where
    T: DeserializeOwned,
{
    let (value, _read) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;

    Ok(value)
}
