/// Block type code. One byte per voxel in the dense chunk arrays.
///
/// The only semantic the store enforces is that `BlockId::AIR` (0) is the
/// "empty" block: it is the zero value, so freshly allocated storage is air,
/// and the surface cache skips it.
///
/// The enumeration is expected to grow. Codes the current build does not know
/// are carried through unchanged rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockId(pub u8);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);
    pub const GRASS: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const STONE: BlockId = BlockId(3);
    pub const WATER: BlockId = BlockId(4);

    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u8 {
        self.0
    }

    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    /// Is this code part of the enumeration this build understands?
    pub const fn is_known(self) -> bool {
        self.0 <= Self::WATER.0
    }

    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "air",
            1 => "grass",
            2 => "dirt",
            3 => "stone",
            4 => "water",
            _ => "unknown",
        }
    }
}

impl From<u8> for BlockId {
    fn from(code: u8) -> Self {
        Self(code)
    }
}
