//! Group resize planning
//!
//! Turns a desired-vs-current member count into a signed resize request.
//! A request is only ever produced for a real change: equal counts yield
//! `None` so callers can skip the remote call entirely.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Direction of a group resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    ScaleOut,
    ScaleIn,
}

impl ScaleDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleDirection::ScaleOut => "scale_out",
            ScaleDirection::ScaleIn => "scale_in",
        }
    }
}

impl std::fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed size of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub direction: ScaleDirection,
    pub magnitude: NonZeroU32,
}

/// Compute the change from `current` to `desired` members.
///
/// Returns `None` when the counts are equal.
pub fn compute_delta(current: u32, desired: u32) -> Option<Delta> {
    let direction = if desired > current {
        ScaleDirection::ScaleOut
    } else {
        ScaleDirection::ScaleIn
    };
    NonZeroU32::new(desired.abs_diff(current)).map(|magnitude| Delta {
        direction,
        magnitude,
    })
}

/// Node layout required when populating an empty group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub flavor: String,
    pub data_volume_type: String,
    pub data_volume_size: u32,
    pub data_volume_count: u32,
}

/// A validated, non-empty resize of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    pub group: String,
    pub direction: ScaleDirection,
    pub magnitude: NonZeroU32,
    /// Present only when growing a group that had no members before
    pub new_member_spec: Option<MemberSpec>,
}

impl ResizeRequest {
    /// Plan the resize of `group` from `current` to `desired` members.
    ///
    /// `current` is `None` when the group had no prior configuration. Growing
    /// an empty group needs `member_spec`, because the remote API cannot
    /// populate a group from a bare count.
    pub fn plan(
        group: impl Into<String>,
        current: Option<u32>,
        desired: u32,
        member_spec: Option<MemberSpec>,
    ) -> Result<Option<Self>> {
        let group = group.into();
        let previous = current.unwrap_or(0);

        let Some(delta) = compute_delta(previous, desired) else {
            return Ok(None);
        };

        let new_member_spec = match (previous, delta.direction) {
            (0, ScaleDirection::ScaleOut) => Some(member_spec.ok_or_else(|| {
                CloudError::invariant(format!(
                    "group '{}' has no members yet; a member layout is required to add {} node(s)",
                    group, delta.magnitude
                ))
            })?),
            _ => None,
        };

        Ok(Some(Self {
            group,
            direction: delta.direction,
            magnitude: delta.magnitude,
            new_member_spec,
        }))
    }

    pub fn is_scale_out(&self) -> bool {
        self.direction == ScaleDirection::ScaleOut
    }
}

/// Named group with its member count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSize {
    pub name: String,
    pub count: u32,
}

impl GroupSize {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Plan resizes for a list of user-named groups.
///
/// Groups are matched by name; unchanged groups are skipped. Groups that
/// only exist in `new` cannot be created by a resize and are rejected, as
/// are groups removed from the list.
pub fn custom_deltas(old: &[GroupSize], new: &[GroupSize]) -> Result<Vec<ResizeRequest>> {
    if let Some(added) = new.iter().find(|n| !old.iter().any(|o| o.name == n.name)) {
        return Err(CloudError::invariant(format!(
            "custom group '{}' cannot be added by resizing",
            added.name
        )));
    }
    if let Some(removed) = old.iter().find(|o| !new.iter().any(|n| n.name == o.name)) {
        return Err(CloudError::invariant(format!(
            "custom group '{}' cannot be removed by resizing",
            removed.name
        )));
    }

    let mut requests = Vec::new();
    for group in new {
        let previous = old
            .iter()
            .find(|o| o.name == group.name)
            .map(|o| o.count);
        if let Some(delta) = compute_delta(previous.unwrap_or(0), group.count) {
            requests.push(ResizeRequest {
                group: group.name.clone(),
                direction: delta.direction,
                magnitude: delta.magnitude,
                new_member_spec: None,
            });
        }
    }
    Ok(requests)
}
