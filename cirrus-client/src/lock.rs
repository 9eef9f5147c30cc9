use cirrus_dav::types::{ActiveLock, LockResponse, LockScope, LockType, Owner, Timeout};

/// Flat record of a LOCK success, as the embedding UI consumes it: every
/// field is the raw string the server reported, present only if the
/// corresponding element appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockInfo {
    pub locktype: Option<String>,
    pub lockscope: Option<String>,
    pub depth: Option<String>,
    pub timeout: Option<String>,
    pub owner: Option<String>,
    pub locktoken: Option<String>,
}

impl LockInfo {
    /// flatten the first activelock of a LOCK response body
    pub fn from_lock_response(resp: &LockResponse) -> Self {
        resp.0.first().map(Self::from_active_lock).unwrap_or_default()
    }

    pub fn from_active_lock(lock: &ActiveLock) -> Self {
        LockInfo {
            locktype: lock.locktype.map(|t| {
                match t {
                    LockType::Write => "write",
                }
                .to_string()
            }),
            lockscope: lock.lockscope.map(|s| {
                match s {
                    LockScope::Exclusive => "exclusive",
                    LockScope::Shared => "shared",
                }
                .to_string()
            }),
            depth: lock.depth.map(|d| d.as_str().to_string()),
            timeout: lock.timeout.map(|t| match t {
                Timeout::Infinite => "Infinite".to_string(),
                Timeout::Seconds(n) => format!("Second-{}", n),
            }),
            owner: lock.owner.as_ref().and_then(|o| match o {
                Owner::Txt(txt) => Some(txt.clone()),
                Owner::Href(href) => Some(href.0.clone()),
                Owner::Unknown => None,
            }),
            locktoken: lock.locktoken.as_ref().map(|t| t.0 .0.clone()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.locktoken.as_deref()
    }
}

/// Where a lock-guarded operation stands. One token drives exactly one
/// operation at a time: lock, act, unlock, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    Idle,
    Locking,
    Acting,
    Unlocking,
    Done,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_dav::types::{Depth, Href, LockToken};

    #[test]
    fn flatten_firmware_active_lock() {
        let lock = ActiveLock {
            lockscope: Some(LockScope::Exclusive),
            locktype: Some(LockType::Write),
            depth: Some(Depth::Zero),
            owner: Some(Owner::Unknown),
            timeout: Some(Timeout::Seconds(600)),
            locktoken: Some(LockToken(Href("opaquelocktoken:abc".into()))),
            lockroot: None,
        };
        let info = LockInfo::from_active_lock(&lock);
        assert_eq!(info.locktype.as_deref(), Some("write"));
        assert_eq!(info.lockscope.as_deref(), Some("exclusive"));
        assert_eq!(info.depth.as_deref(), Some("0"));
        assert_eq!(info.timeout.as_deref(), Some("Second-600"));
        assert_eq!(info.owner, None);
        assert_eq!(info.token(), Some("opaquelocktoken:abc"));
    }

    #[test]
    fn empty_lock_response_flattens_to_default() {
        let info = LockInfo::from_lock_response(&LockResponse(vec![]));
        assert_eq!(info, LockInfo::default());
    }
}
