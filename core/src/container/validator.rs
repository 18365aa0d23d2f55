//! Deployment-time checks on declared injection points.

use crate::beans::{BeanId, Delivery};
use crate::container::Container;
use crate::errors::{error_codes, ContainerError, ContainerResult};
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// **INJECTION POINT VALIDATION**
///
/// Every `Reference`/`Instance` injection point of an active bean must resolve to
/// exactly one bean. Dependencies reached without a proxy must not form a cycle,
/// since constructing any bean on it would recurse into itself.
pub(crate) fn validate(container: &Container) -> ContainerResult<()> {
    let config = container.config();
    let registry = container.registry();
    let resolver = container.resolver();

    let mut order: Vec<BeanId> = Vec::new();
    let mut direct: HashMap<BeanId, Vec<BeanId>> = HashMap::new();

    for bean in registry.active_beans() {
        order.push(bean.id().clone());
        for point in bean.injection_points().iter().filter(|p| p.requires_unique()) {
            let target = match resolver.resolve_unique(&point.required_type, &point.qualifiers) {
                Ok(target) => target,
                Err(_) if !config.validate_injection_points => continue,
                Err(ContainerError::Unsatisfied { .. }) => {
                    return Err(ContainerError::definition(
                        error_codes::UNSATISFIED_INJECTION_POINT,
                        format!(
                            "bean '{}' injects {} but no bean matches",
                            bean.id(),
                            point
                        ),
                    ))
                }
                Err(ContainerError::Ambiguous { candidates, .. }) => {
                    return Err(ContainerError::definition(
                        error_codes::AMBIGUOUS_INJECTION_POINT,
                        format!(
                            "bean '{}' injects {} which matches {}",
                            bean.id(),
                            point,
                            candidates.join(", ")
                        ),
                    ))
                }
                Err(other) => return Err(other),
            };

            if point.delivery == Delivery::Instance || target.scope().is_pseudo() {
                direct
                    .entry(bean.id().clone())
                    .or_default()
                    .push(target.id().clone());
            }
        }
    }

    if config.detect_unproxied_cycles {
        let mut marks: HashMap<BeanId, Mark> = HashMap::new();
        let mut path: Vec<BeanId> = Vec::new();
        for start in &order {
            visit(start, &direct, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit(
    bean: &BeanId,
    direct: &HashMap<BeanId, Vec<BeanId>>,
    marks: &mut HashMap<BeanId, Mark>,
    path: &mut Vec<BeanId>,
) -> ContainerResult<()> {
    match marks.get(bean) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|b| b == bean).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
            cycle.push(bean.to_string());
            return Err(ContainerError::definition(
                error_codes::UNPROXIED_CYCLE,
                format!("dependency cycle without a client proxy: {}", cycle.join(" -> ")),
            ));
        }
        None => {}
    }

    marks.insert(bean.clone(), Mark::Visiting);
    path.push(bean.clone());
    for next in direct.get(bean).map(Vec::as_slice).unwrap_or_default() {
        visit(next, direct, marks, path)?;
    }
    path.pop();
    marks.insert(bean.clone(), Mark::Done);
    Ok(())
}
