//! Progress flags of a consensus round.

use bitflags::bitflags;

bitflags! {
    /// Where this node stands in the current height.
    ///
    /// Exactly one of `PRIMARY` and `BACKUP` is set while the node is a
    /// bookkeeper. The remaining flags only accumulate within a height; a
    /// view change keeps `SIGNATURE_SENT` and `BLOCK_GENERATED`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConsensusState: u8 {
        const PRIMARY = 0x01;
        const BACKUP = 0x02;
        const REQUEST_SENT = 0x04;
        const REQUEST_RECEIVED = 0x08;
        const SIGNATURE_SENT = 0x10;
        const BLOCK_GENERATED = 0x20;
    }
}

impl ConsensusState {
    /// Flags that outlive a view change.
    pub const HEIGHT_SCOPED: Self = Self::SIGNATURE_SENT.union(Self::BLOCK_GENERATED);

    /// Role flags, reassigned on every reset and view change.
    pub const ROLES: Self = Self::PRIMARY.union(Self::BACKUP);

    #[inline]
    pub fn is_primary(self) -> bool {
        self.contains(Self::PRIMARY)
    }

    #[inline]
    pub fn is_backup(self) -> bool {
        self.contains(Self::BACKUP)
    }

    #[inline]
    pub fn block_generated(self) -> bool {
        self.contains(Self::BLOCK_GENERATED)
    }

    /// Makes this node primary or backup, clearing the other role flag.
    pub fn assign_role(&mut self, primary: bool) {
        self.remove(Self::ROLES);
        self.insert(if primary { Self::PRIMARY } else { Self::BACKUP });
    }
}

impl std::fmt::Display for ConsensusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(ConsensusState, &str); 6] = [
            (ConsensusState::PRIMARY, "Primary"),
            (ConsensusState::BACKUP, "Backup"),
            (ConsensusState::REQUEST_SENT, "RequestSent"),
            (ConsensusState::REQUEST_RECEIVED, "RequestReceived"),
            (ConsensusState::SIGNATURE_SENT, "SignatureSent"),
            (ConsensusState::BLOCK_GENERATED, "BlockGenerated"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("Initial")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}
