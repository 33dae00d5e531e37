use async_trait::async_trait;
use uuid::Uuid;

use crate::{DomainError, DomainResult};

/// Internal view of a resource addressed by its public UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: i64,
    pub owner_id: i64,
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Translates a public UUID into internal keys. Implementations must answer
/// with a single lookup so that missing and hidden resources cost the same.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, uuid: Uuid) -> DomainResult<Option<Resolved>>;
}

/// Applies the visibility rules to a lookup result.
///
/// Hidden resources (not owned, not public) report `NotFound`, exactly like
/// missing ones. Public resources may be read by anyone, but only the owner
/// may write them; other callers get `Forbidden`.
pub fn authorize(resolved: Option<Resolved>, caller_id: i64, access: Access) -> DomainResult<Resolved> {
    let resolved = resolved.ok_or(DomainError::NotFound)?;
    if resolved.owner_id == caller_id {
        return Ok(resolved);
    }
    if !resolved.is_public {
        return Err(DomainError::NotFound);
    }
    match access {
        Access::Read => Ok(resolved),
        Access::Write => Err(DomainError::Forbidden),
    }
}

/// Resolves `uuid` through `repo` and authorizes `caller_id` for `access`.
pub async fn resolve_for<R>(repo: &R, uuid: Uuid, caller_id: i64, access: Access) -> DomainResult<Resolved>
where
    R: Resolve + ?Sized,
{
    let resolved = repo.resolve(uuid).await?;
    authorize(resolved, caller_id, access)
}

/// Parties-only visibility, used for bookings: anyone outside `parties`
/// sees `NotFound`.
pub fn authorize_party(parties: &[i64], caller_id: i64) -> DomainResult<()> {
    if parties.contains(&caller_id) {
        Ok(())
    } else {
        Err(DomainError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: i64 = 1;
    const STRANGER: i64 = 2;

    fn resource(is_public: bool) -> Option<Resolved> {
        Some(Resolved { id: 10, owner_id: OWNER, is_public })
    }

    #[test]
    fn test_owner_reads_and_writes() {
        for public in [true, false] {
            assert!(authorize(resource(public), OWNER, Access::Read).is_ok());
            assert!(authorize(resource(public), OWNER, Access::Write).is_ok());
        }
    }

    #[test]
    fn test_hidden_is_indistinguishable_from_missing() {
        for access in [Access::Read, Access::Write] {
            let hidden = authorize(resource(false), STRANGER, access).unwrap_err();
            let missing = authorize(None, STRANGER, access).unwrap_err();
            assert_eq!(hidden, missing);
            assert_eq!(hidden, DomainError::NotFound);
        }
    }

    #[test]
    fn test_public_resource_is_read_only_for_strangers() {
        assert_eq!(authorize(resource(true), STRANGER, Access::Read).unwrap().id, 10);
        assert_eq!(
            authorize(resource(true), STRANGER, Access::Write).unwrap_err(),
            DomainError::Forbidden
        );
    }

    #[test]
    fn test_party_check() {
        assert!(authorize_party(&[3, 4], 4).is_ok());
        assert_eq!(authorize_party(&[3, 4], 5).unwrap_err(), DomainError::NotFound);
    }
}
