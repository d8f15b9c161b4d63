//! Learning-rate updates over optimizer parameter groups.

use serde::{Deserialize, Serialize};

/// A named group of parameters sharing one learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    pub name: String,
    pub lr: f64,
}

impl ParamGroup {
    pub fn new(name: &str, lr: f64) -> Self {
        Self {
            name: name.to_string(),
            lr,
        }
    }
}

/// Anything exposing mutable parameter groups, in optimizer order.
pub trait ParamGroups {
    fn param_groups_mut(&mut self) -> &mut [ParamGroup];
}

impl ParamGroups for Vec<ParamGroup> {
    fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        self.as_mut_slice()
    }
}

/// Set `lr` on every group of the base model. The last group (the head) keeps its rate.
pub fn adjust_lr<O: ParamGroups>(lr: f64, mut optimizer: O) -> O {
    let groups = optimizer.param_groups_mut();
    let base = groups.len().saturating_sub(1);
    for group in &mut groups[..base] {
        group.lr = lr;
    }
    tracing::debug!(lr, groups = base, "Adjusted base learning rate");
    optimizer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_group_untouched() {
        let groups = vec![
            ParamGroup::new("backbone", 0.1),
            ParamGroup::new("neck", 0.1),
            ParamGroup::new("head", 0.1),
        ];
        let groups = adjust_lr(0.01, groups);
        assert_eq!(groups[0].lr, 0.01);
        assert_eq!(groups[1].lr, 0.01);
        assert_eq!(groups[2].lr, 0.1);
    }

    #[test]
    fn test_single_and_empty() {
        let groups = adjust_lr(0.5, vec![ParamGroup::new("only", 0.1)]);
        assert_eq!(groups[0].lr, 0.1);
        let empty: Vec<ParamGroup> = adjust_lr(0.5, Vec::new());
        assert!(empty.is_empty());
    }
}
