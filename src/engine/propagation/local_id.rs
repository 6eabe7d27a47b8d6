/// A propagator-local index for one of the variables it subscribed to. The engine hands the
/// local id back on every notification so the propagator can tell its variables apart without
/// a lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct LocalId(u32);

impl LocalId {
    pub(crate) const fn from(value: u32) -> Self {
        LocalId(value)
    }

    pub(crate) fn unpack(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
