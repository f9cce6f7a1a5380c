//! Stage B: literal search & replace on the base URL.

use tracing::debug;

use super::snapshot::{CompiledRule, CompiledSearchReplace};
use super::trace::Tracer;
use crate::domain::entities::{GlobalRuleKind, StepKind};

/// Global entries not overridden by any of the rule's own entries.
pub fn effective_globals<'s>(
    rule: &CompiledRule,
    globals: &'s [CompiledSearchReplace],
) -> Vec<&'s CompiledSearchReplace> {
    globals
        .iter()
        .filter(|global| {
            let overridden = rule.search_replace.iter().any(|own| own.overrides(global));
            if overridden {
                debug!(
                    rule_id = %rule.rule.id,
                    global_id = global.global_id.as_deref().unwrap_or_default(),
                    search = %global.search,
                    "Global search & replace overridden by rule"
                );
            }
            !overridden
        })
        .collect()
}

/// Applies effective globals (by order) and then the rule's entries.
pub(crate) fn apply(
    base: String,
    rule: &CompiledRule,
    globals: &[CompiledSearchReplace],
    tracer: &mut Tracer,
) -> String {
    let mut url = base;

    for entry in effective_globals(rule, globals)
        .into_iter()
        .chain(rule.search_replace.iter())
    {
        let next = entry.apply(&url);
        if next == url {
            continue;
        }

        let description = format!("Search & replace: \"{}\" -> \"{}\"", entry.search, entry.replace);
        match &entry.global_id {
            Some(id) => {
                tracer.record(StepKind::Global, format!("Global {description}"), &url, &next);
                tracer.apply_global(id, GlobalRuleKind::Search, description);
            }
            None => tracer.record(StepKind::Rule, description, &url, &next),
        }
        url = next;
    }

    url
}
