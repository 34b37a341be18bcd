use crate::id::SnowflakeId;

/// A minimal interface for generating Snowflake IDs.
///
/// Implementations are shared by reference across threads. A host process
/// builds one generator at startup, wraps it in an [`Arc`], and hands a clone
/// of that handle to every request path.
///
/// [`Arc`]: std::sync::Arc
pub trait SnowflakeGenerator {
    /// The node identifier embedded in every ID this generator issues.
    fn node_id(&self) -> u16;

    /// Generates the next ID.
    ///
    /// IDs returned by one generator are unique and strictly increasing. This
    /// never fails; if more than 4096 IDs are requested within a single
    /// millisecond the call spins until the clock advances.
    fn generate(&self) -> SnowflakeId;
}

impl<G: SnowflakeGenerator + ?Sized> SnowflakeGenerator for std::sync::Arc<G> {
    fn node_id(&self) -> u16 {
        (**self).node_id()
    }

    fn generate(&self) -> SnowflakeId {
        (**self).generate()
    }
}
