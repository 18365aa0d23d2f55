//! Freeze-time checks on `specializes` links.

use crate::beans::{BeanId, BeanMetadata};
use crate::errors::{error_codes, ContainerError, ContainerResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// **SPECIALIZATION VALIDATION**
///
/// Checks every link and returns the beans excluded from resolution: targets of an
/// enabled specializer, followed transitively down the chain.
pub(crate) fn validate(
    beans: &[Arc<BeanMetadata>],
    index: &HashMap<BeanId, usize>,
    enabled: &[bool],
) -> ContainerResult<HashSet<usize>> {
    let mut claimed: HashMap<usize, usize> = HashMap::new();

    for (position, bean) in beans.iter().enumerate() {
        let Some(target_id) = bean.specializes() else {
            continue;
        };
        let target_position = *index.get(target_id).ok_or_else(|| {
            ContainerError::definition(
                error_codes::SPECIALIZED_BEAN_MISSING,
                format!(
                    "bean '{}' specializes '{}' which is not registered",
                    bean.id(),
                    target_id
                ),
            )
        })?;
        let target = &beans[target_position];

        if let Some(missing) = target.types().iter().find(|ty| !bean.types().contains(ty)) {
            return Err(ContainerError::definition(
                error_codes::SPECIALIZATION_TYPES,
                format!(
                    "bean '{}' specializes '{}' but lacks its bean type {}",
                    bean.id(),
                    target.id(),
                    missing
                ),
            ));
        }

        if !bean.qualifiers().covers(target.qualifiers()) {
            return Err(ContainerError::definition(
                error_codes::SPECIALIZATION_QUALIFIERS,
                format!(
                    "bean '{}' specializes '{}' but does not carry its qualifiers {}",
                    bean.id(),
                    target.id(),
                    target.qualifiers()
                ),
            ));
        }

        check_cycle(beans, index, position)?;

        if enabled[position] {
            if let Some(previous) = claimed.insert(target_position, position) {
                return Err(ContainerError::definition(
                    error_codes::INCONSISTENT_SPECIALIZATION,
                    format!(
                        "beans '{}' and '{}' both specialize '{}'",
                        beans[previous].id(),
                        bean.id(),
                        target.id()
                    ),
                ));
            }
        }
    }

    let mut excluded = HashSet::new();
    for &target in claimed.keys() {
        let mut current = Some(target);
        while let Some(position) = current {
            if !excluded.insert(position) {
                break;
            }
            current = beans[position]
                .specializes()
                .and_then(|next| index.get(next).copied());
        }
    }
    Ok(excluded)
}

fn check_cycle(
    beans: &[Arc<BeanMetadata>],
    index: &HashMap<BeanId, usize>,
    start: usize,
) -> ContainerResult<()> {
    let mut chain = vec![beans[start].id().to_string()];
    let mut current = start;
    while let Some(next) = beans[current]
        .specializes()
        .and_then(|id| index.get(id).copied())
    {
        chain.push(beans[next].id().to_string());
        if next == start {
            return Err(ContainerError::definition(
                error_codes::SPECIALIZATION_CYCLE,
                format!("specialization cycle: {}", chain.join(" -> ")),
            ));
        }
        if chain.len() > beans.len() {
            break;
        }
        current = next;
    }
    Ok(())
}
