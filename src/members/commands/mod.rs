//! Write operations for member records, plus the member-ledger synchronizer.

pub mod sqlite;

use async_trait::async_trait;

use super::domain::{Member, NewMember};

#[derive(Debug, thiserror::Error)]
pub enum MemberCommandError {
    #[error("a member with number '{0}' already exists")]
    DuplicateMemberNo(String),
    #[error("a member with payroll number '{0}' already exists")]
    DuplicatePayrollNo(String),
    /// The member still owns savings accounts, loans, or history rows.
    #[error("member is referenced and cannot be deleted")]
    Referenced,
    #[error("member does not exist")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait MemberCommands {
    async fn create_member(&self, member: NewMember) -> Result<Member, MemberCommandError>;

    async fn update_member(
        &self,
        member_id: i64,
        member: NewMember,
    ) -> Result<Member, MemberCommandError>;

    /// Delete a member. Referential protection refuses the delete while any
    /// savings account, loan, receipt, or ledger row references them.
    async fn delete_member(&self, member_id: i64) -> Result<(), MemberCommandError>;
}
