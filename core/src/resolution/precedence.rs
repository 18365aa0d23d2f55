//! Tie-break rules shared by type-based and name-based resolution.
//! Alternatives are considered before priority.

use crate::beans::BeanMetadata;
use std::sync::Arc;

pub(crate) fn tie_break(candidates: Vec<Arc<BeanMetadata>>) -> Vec<Arc<BeanMetadata>> {
    select_priority(prefer_alternatives(candidates))
}

/// With more than one candidate and at least one alternative, keeps alternatives only.
pub(crate) fn prefer_alternatives(candidates: Vec<Arc<BeanMetadata>>) -> Vec<Arc<BeanMetadata>> {
    if candidates.len() > 1 && candidates.iter().any(|b| b.is_alternative()) {
        candidates.into_iter().filter(|b| b.is_alternative()).collect()
    } else {
        candidates
    }
}

/// A strict priority maximum wins; unprioritized beans rank lowest. Ties leave the set as is.
pub(crate) fn select_priority(candidates: Vec<Arc<BeanMetadata>>) -> Vec<Arc<BeanMetadata>> {
    if candidates.len() < 2 {
        return candidates;
    }
    let Some(highest) = candidates.iter().map(|b| b.priority()).max() else {
        return candidates;
    };
    let mut top = candidates.iter().filter(|b| b.priority() == highest);
    match (top.next(), top.next()) {
        (Some(winner), None) => vec![Arc::clone(winner)],
        _ => candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bean(id: &str, alternative: bool, priority: Option<i32>) -> Arc<BeanMetadata> {
        let mut builder = BeanMetadata::builder(id).value(0u8);
        if alternative {
            builder = builder.alternative();
        }
        if let Some(priority) = priority {
            builder = builder.priority(priority);
        }
        Arc::new(builder.build().unwrap())
    }

    fn ids(beans: &[Arc<BeanMetadata>]) -> Vec<&str> {
        beans.iter().map(|b| b.id().as_str()).collect()
    }

    #[test]
    fn test_alternatives_first() {
        let survivors = tie_break(vec![
            bean("plain", false, Some(100)),
            bean("alt", true, Some(1)),
        ]);
        assert_eq!(ids(&survivors), vec!["alt"]);
    }

    #[test]
    fn test_strict_priority_maximum() {
        let survivors = tie_break(vec![
            bean("low", false, Some(1)),
            bean("none", false, None),
            bean("high", false, Some(5)),
        ]);
        assert_eq!(ids(&survivors), vec!["high"]);
    }

    #[test]
    fn test_priority_tie_keeps_all() {
        let survivors = tie_break(vec![bean("p", true, Some(3)), bean("q", true, Some(3))]);
        assert_eq!(ids(&survivors), vec!["p", "q"]);

        let survivors = tie_break(vec![bean("p", false, None), bean("q", false, None)]);
        assert_eq!(ids(&survivors), vec!["p", "q"]);
    }
}
