// src/identity/mod.rs

//! Privilege switching.
//!
//! Switching is one-way: once [`switch_to`] succeeds the process cannot get
//! its original identity back. Callers must switch before creating any
//! resource (temp dir, FIFO, child) that the original identity should not
//! own.

use crate::errors::Result;

/// A resolved system user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

#[cfg(unix)]
pub use unix::{current, resolve, switch_to};

#[cfg(unix)]
mod unix {
    use nix::errno::Errno;
    use nix::unistd::{Gid, Uid, User, geteuid, setgid, setuid};
    use tracing::{debug, info};

    use super::*;
    use crate::errors::ExecError;

    /// Look `username` up in the system user database.
    pub fn resolve(username: &str) -> Result<Identity> {
        let fail = |reason: String| ExecError::IdentityResolution {
            username: username.to_string(),
            reason,
        };

        if username.is_empty() {
            return Err(fail("empty user name".to_string()));
        }

        match User::from_name(username) {
            Ok(Some(user)) => Ok(Identity {
                name: user.name,
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
            }),
            Ok(None) => Err(fail("no such user".to_string())),
            Err(errno) => Err(fail(errno.desc().to_string())),
        }
    }

    /// The identity the process is currently running as.
    pub fn current() -> Result<Identity> {
        let uid = geteuid();
        match User::from_uid(uid) {
            Ok(Some(user)) => Ok(Identity {
                name: user.name,
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
            }),
            Ok(None) => Err(ExecError::IdentityResolution {
                username: uid.to_string(),
                reason: "uid has no passwd entry".to_string(),
            }),
            Err(errno) => Err(ExecError::IdentityResolution {
                username: uid.to_string(),
                reason: errno.desc().to_string(),
            }),
        }
    }

    /// Drop to `identity`: groups first, then gid, then uid.
    ///
    /// For a non-root target, verifies afterwards that root cannot be
    /// regained.
    pub fn switch_to(identity: &Identity) -> Result<()> {
        let fail = |step: &str, errno: Errno| ExecError::IdentitySwitch {
            username: identity.name.clone(),
            reason: format!("{step}: {}", errno.desc()),
        };

        let uid = Uid::from_raw(identity.uid);
        let gid = Gid::from_raw(identity.gid);

        if geteuid().is_root() {
            drop_supplementary_groups(gid).map_err(|e| fail("setgroups", e))?;
        }
        setgid(gid).map_err(|e| fail("setgid", e))?;
        setuid(uid).map_err(|e| fail("setuid", e))?;

        if !uid.is_root() && setuid(Uid::from_raw(0)).is_ok() {
            return Err(ExecError::IdentitySwitch {
                username: identity.name.clone(),
                reason: "root privileges could be regained after switching".to_string(),
            });
        }
        debug!(uid = identity.uid, "privilege probe confirmed switch is irreversible");

        info!(
            user = %identity.name,
            uid = identity.uid,
            gid = identity.gid,
            "switched process identity"
        );
        Ok(())
    }

    #[cfg(not(target_vendor = "apple"))]
    pub(super) fn drop_supplementary_groups(gid: Gid) -> nix::Result<()> {
        nix::unistd::setgroups(&[gid])
    }

    // nix exposes no setgroups on Apple targets. Refuse rather than keep
    // root's supplementary groups.
    #[cfg(target_vendor = "apple")]
    pub(super) fn drop_supplementary_groups(_gid: Gid) -> nix::Result<()> {
        Err(Errno::ENOSYS)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::errors::ExecError;

    #[test]
    fn root_resolves_to_uid_zero() {
        let root = resolve("root").unwrap();
        assert_eq!(root.uid, 0);
        assert_eq!(root.name, "root");
    }

    #[test]
    fn unknown_user_is_a_resolution_error() {
        let err = resolve("sealexec-no-such-user-7f3a").unwrap_err();
        assert!(matches!(err, ExecError::IdentityResolution { .. }));
        assert!(err.to_string().contains("sealexec-no-such-user-7f3a"));
    }

    #[test]
    fn empty_user_is_rejected() {
        assert!(matches!(
            resolve(""),
            Err(ExecError::IdentityResolution { .. })
        ));
    }

    #[test]
    fn switching_to_self_as_unprivileged_user_succeeds() {
        let me = current().unwrap();
        // Root is covered by the binary-level test that drops to `nobody`.
        let same_group = nix::unistd::getgid().as_raw() == me.gid
            && nix::unistd::getegid().as_raw() == me.gid;
        if me.uid == 0 || !same_group {
            return;
        }
        switch_to(&me).unwrap();
        assert_eq!(nix::unistd::geteuid().as_raw(), me.uid);
    }

    #[cfg(target_vendor = "apple")]
    #[test]
    fn supplementary_groups_cannot_be_dropped_on_apple() {
        let gid = nix::unistd::Gid::from_raw(65534);
        assert_eq!(
            unix::drop_supplementary_groups(gid),
            Err(nix::errno::Errno::ENOSYS)
        );
    }

    #[test]
    fn unprivileged_user_cannot_switch_to_root() {
        let me = current().unwrap();
        if me.uid == 0 {
            return;
        }
        let root = resolve("root").unwrap();
        assert!(matches!(
            switch_to(&root),
            Err(ExecError::IdentitySwitch { .. })
        ));
    }
}
