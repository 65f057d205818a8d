bitflags::bitflags! {
    /// Status bits packed into the single `flags` byte of a LAN packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PeerFlags: u8 {
        const DOWNED = 1 << 0;
        const PERK_QUICKFIRE = 1 << 1;
        const PERK_SPEED = 1 << 2;
        const PERK_REVIVE = 1 << 3;
        const REVIVING = 1 << 4;
        /// Set for team 1, clear for team 0.
        const TEAM = 1 << 5;
        const TEAM_MODE = 1 << 6;
    }
}

impl Default for PeerFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl PeerFlags {
    pub fn team(&self) -> u8 {
        u8::from(self.contains(Self::TEAM))
    }

    pub fn with_team(mut self, team: u8) -> Self {
        self.set(Self::TEAM, team == 1);
        self
    }
}
