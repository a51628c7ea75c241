//! Binding reconciliation.
//!
//! Computes the next policy state from the current one plus a single
//! `(role, member)` grant or revoke. Both functions mutate the policy in
//! place; [`revoke`] checks before touching anything, so on error the
//! policy is exactly as it was.
//!
//! Only the unconditional binding for a role is reconciled. Conditional
//! bindings for the same role are left exactly as they are.

use crate::error::{CoreError, Result};
use crate::policy::{Binding, Policy};

/// What [`grant`] did to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// No binding existed for the role; one was added.
    BindingCreated,
    /// The member joined an existing binding.
    MemberAdded,
    /// The member already held the role. Policy unchanged.
    AlreadyMember,
}

impl GrantOutcome {
    /// Whether the policy was modified.
    pub fn changed(&self) -> bool {
        !matches!(self, GrantOutcome::AlreadyMember)
    }
}

/// What [`revoke`] did to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The member was removed; other members keep the role.
    MemberRemoved,
    /// The member was the last one, so the whole binding went away.
    BindingRemoved,
}

/// Grant `role` to `member`.
///
/// Never fails. All other bindings are left untouched.
pub fn grant(policy: &mut Policy, role: &str, member: &str) -> GrantOutcome {
    match policy.unconditional_binding_position(role) {
        Some(index) => {
            if policy.bindings[index].members.insert(member.to_string()) {
                GrantOutcome::MemberAdded
            } else {
                GrantOutcome::AlreadyMember
            }
        }
        None => {
            policy.bindings.push(Binding::new(role, [member]));
            GrantOutcome::BindingCreated
        }
    }
}

/// Revoke `role` from `member`.
///
/// Fails with [`CoreError::RoleNotExist`] if there is no unconditional
/// binding for the role, or if that binding does not contain the member. Removing the last
/// member removes the binding. Binding order is not preserved.
pub fn revoke(policy: &mut Policy, role: &str, member: &str) -> Result<RevokeOutcome> {
    let not_bound = || CoreError::RoleNotExist {
        role: role.to_string(),
        member: member.to_string(),
    };

    let index = policy.unconditional_binding_position(role).ok_or_else(not_bound)?;
    let binding = &mut policy.bindings[index];

    if !binding.contains(member) {
        return Err(not_bound());
    }

    if binding.members.len() == 1 {
        policy.bindings.swap_remove(index);
        Ok(RevokeOutcome::BindingRemoved)
    } else {
        binding.members.remove(member);
        Ok(RevokeOutcome::MemberRemoved)
    }
}
