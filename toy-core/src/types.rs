use glam::Vec2;

/// Stable identifier for a particle in a [`crate::particle::ParticleSystem`].
///
/// Ids are handed out in increasing order and never reused, so the
/// particle storage stays sorted by id and a stale id simply fails to
/// resolve once its particle has been removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub u64);

/// Pointer position in canvas coordinates plus the primary button state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub pos: Vec2,
    pub pressed: bool,
}
