//! The authorization boundary, consulted by the handle context before a
//! handler body ever runs.

use ledger_types::ids::{AccountId, Functionality};

/// The outcome of a privileged-operation check: finer-grained than a plain
/// bool because "this operation has no privilege requirement at all" is a
/// distinct outcome from "the payer was checked and denied".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrivilegedAuthorization {
    /// No privilege check applies to this functionality.
    Unnecessary,
    Authorized,
    Unauthorized,
    /// The operation can never be authorized for any payer (e.g. deleting a
    /// protected system entity).
    Impermissible,
}

/// A transaction body the authorizer needs to inspect for privileged or
/// deletion-sensitive operations. Deliberately opaque beyond the two checks
/// the core actually performs — the core has no opinion on concrete business
/// transaction schemas.
pub trait AuthorizableBody: Send + Sync {
    /// `true` if this body attempts to delete an entity the system protects.
    fn targets_protected_entity(&self) -> bool;
}

/// Decides whether a payer may perform a functionality, and whether
/// privileged system operations and fee waivers apply.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, payer: AccountId, functionality: Functionality) -> bool;

    fn has_privileged_authorization(
        &self,
        payer: AccountId,
        functionality: Functionality,
        body: &dyn AuthorizableBody,
    ) -> PrivilegedAuthorization;

    fn has_waived_fees(
        &self,
        payer: AccountId,
        functionality: Functionality,
        body: &dyn AuthorizableBody,
    ) -> bool;

    fn is_super_user(&self, payer: AccountId) -> bool;
}
