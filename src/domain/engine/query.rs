//! Stage C: query parameter assembly.
//!
//! The starting set depends on the rule's query mode. Forward and keep carry
//! the original pairs byte-for-byte; discard starts empty and reinstates
//! whitelisted pairs. Static parameters are appended last, global ones first
//! unless a rule static uses the same key.

use std::collections::HashSet;

use tracing::debug;
use url::form_urlencoded;

use super::snapshot::{CompiledKept, CompiledRule, CompiledSnapshot, StaticEntry};
use super::trace::Tracer;
use crate::domain::entities::{GlobalRuleKind, QueryMode};
use crate::utils::encoding::encode_component;

/// One `key=value` pair of the incoming query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalParam<'a> {
    /// The pair exactly as written.
    pub raw: &'a str,
    /// Undecoded value text.
    pub raw_value: &'a str,
    pub key: String,
    pub value: String,
}

/// Splits a raw query into pairs, skipping empty segments.
pub fn parse_params(query: Option<&str>) -> Vec<OriginalParam<'_>> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|piece| !piece.is_empty())
        .filter_map(|piece| {
            let (key, value) = form_urlencoded::parse(piece.as_bytes()).next()?;
            Some(OriginalParam {
                raw: piece,
                raw_value: piece.split_once('=').map_or("", |(_, v)| v),
                key: key.into_owned(),
                value: value.into_owned(),
            })
        })
        .collect()
}

impl CompiledKept {
    /// Encoded output value when this entry reinstates `param`.
    pub(crate) fn reinstate(&self, param: &OriginalParam<'_>) -> Option<String> {
        if !self.matches_key(&param.key) {
            return None;
        }

        let Some(pattern) = self.value_pattern() else {
            return Some(if self.skip_encoding {
                param.raw_value.to_string()
            } else {
                encode_component(&param.value)
            });
        };

        let captures = pattern.captures(&param.value)?;
        let whole = captures.get(0)?;
        let selected = captures.get(1).unwrap_or(whole);

        Some(if !self.skip_encoding {
            encode_component(selected.as_str())
        } else if selected.start() == 0 && selected.end() == param.value.len() {
            param.raw_value.to_string()
        } else {
            selected.as_str().to_string()
        })
    }
}

struct KeptSlot<'e> {
    key: String,
    pieces: Vec<String>,
    rank: usize,
    entry: &'e CompiledKept,
}

/// Whitelist pass for discard mode.
///
/// For each original parameter the last matching entry (globals first, then
/// rule entries) decides. Every occurrence reinstated by the same entry is
/// kept in scan order. When different entries land on the same output key the
/// higher-precedence entry takes the key over, at the position of the first.
fn reinstate_kept(
    params: &[OriginalParam<'_>],
    rule: &CompiledRule,
    snapshot: &CompiledSnapshot,
    tracer: &mut Tracer,
) -> Vec<String> {
    let entries: Vec<&CompiledKept> = snapshot.global_kept().iter().chain(rule.kept.iter()).collect();
    let mut slots: Vec<KeptSlot<'_>> = Vec::new();

    for param in params {
        let decided = entries
            .iter()
            .enumerate()
            .rev()
            .find_map(|(rank, entry)| entry.reinstate(param).map(|value| (rank, *entry, value)));

        let Some((rank, entry, value)) = decided else {
            debug!(key = %param.key, "Query parameter discarded");
            continue;
        };

        let key = entry.target_key.clone().unwrap_or_else(|| param.key.clone());
        let piece = format!("{}={}", encode_component(&key), value);

        match slots.iter_mut().find(|slot| slot.key == key) {
            Some(slot) if slot.rank == rank => slot.pieces.push(piece),
            Some(slot) if rank > slot.rank => {
                debug!(key = %key, "Kept parameter taken over by later entry");
                slot.pieces = vec![piece];
                slot.rank = rank;
                slot.entry = entry;
            }
            Some(_) => {}
            None => slots.push(KeptSlot {
                key,
                pieces: vec![piece],
                rank,
                entry,
            }),
        }
    }

    slots
        .into_iter()
        .flat_map(|slot| {
            if let Some(id) = &slot.entry.global_id {
                tracer.apply_global(
                    id,
                    GlobalRuleKind::Kept,
                    format!("Kept parameter '{}' via /{}/", slot.key, slot.entry.key_pattern),
                );
            }
            slot.pieces
        })
        .collect()
}

fn static_piece(entry: &StaticEntry) -> String {
    let value = if entry.param.skip_encoding {
        entry.param.value.clone()
    } else {
        encode_component(&entry.param.value)
    };
    format!("{}={}", encode_component(&entry.param.key), value)
}

/// Static parameters: surviving globals first, then the rule's own.
fn static_pieces(rule: &CompiledRule, snapshot: &CompiledSnapshot, tracer: &mut Tracer) -> Vec<String> {
    let rule_keys: HashSet<&str> = rule.statics.iter().map(|s| s.param.key.as_str()).collect();
    let mut pieces = Vec::new();

    for global in snapshot.global_statics() {
        if rule_keys.contains(global.param.key.as_str()) {
            debug!(key = %global.param.key, rule_id = %rule.rule.id, "Global static overridden by rule");
            continue;
        }
        pieces.push(static_piece(global));
        if let Some(id) = &global.global_id {
            tracer.apply_global(
                id,
                GlobalRuleKind::Static,
                format!("Static parameter {}={}", global.param.key, global.param.value),
            );
        }
    }

    pieces.extend(rule.statics.iter().map(static_piece));
    pieces
}

/// Serialized query for the transformed URL, without a leading `?`.
pub(crate) fn build_query(
    query: Option<&str>,
    rule: &CompiledRule,
    snapshot: &CompiledSnapshot,
    tracer: &mut Tracer,
) -> (String, QueryMode) {
    let params = parse_params(query);
    let mode = rule.rule.query_mode();

    let mut pieces: Vec<String> = match mode {
        QueryMode::Forward | QueryMode::Keep => params.iter().map(|p| p.raw.to_string()).collect(),
        QueryMode::Discard => reinstate_kept(&params, rule, snapshot, tracer),
    };
    pieces.extend(static_pieces(rule, snapshot, tracer));

    (pieces.join("&"), mode)
}
