//! Combiner render-state model.
//!
//! [`CombinerDescriptor`] is the immutable value the upstream command-stream
//! decoder resolves once per state change. It captures every fixed-function
//! input the generated shader depends on, and nothing else: two descriptors
//! that compare equal must always yield byte-identical source, which is what
//! makes it usable as a cache key.
//!
//! All enumerations are closed sets. The upstream resolver is contracted to
//! stay inside them; [`CombinerDescriptor::validate`] enforces the cross-field
//! rules and panics on violation, since an out-of-contract descriptor is an
//! upstream bug rather than user input.

/// Texture addressing mode for one axis of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Clamp coordinates to the tile bounds.
    Clamp,
    /// Repeat the tile.
    Wrap,
    /// Repeat with every other tile reflected.
    Mirror,
}

impl WrapMode {
    /// Token used to select the template branch for this mode.
    pub(crate) fn token(self) -> &'static str {
        match self {
            WrapMode::Clamp => "clamp",
            WrapMode::Wrap => "wrap",
            WrapMode::Mirror => "mirror",
        }
    }
}

/// Which texture read engine serves a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadEngine {
    /// Standard texel reads with full addressing and filtering logic.
    Normal,
    /// Reads from multisampled storage, resolved in the shader.
    Multisampled,
    /// Fast blit path bypassing addressing and combiner math.
    ///
    /// Copy mode is a whole-program path: a copy-mode descriptor has unit 0
    /// enabled in `CopyMode` and unit 1 disabled. Anything else is a
    /// contract violation.
    CopyMode,
}

/// Selector between the bit-exact emulation variant and the faster,
/// lower-fidelity sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccuracyTier {
    /// Bit-exact addressing and filtering, synthesized in the shader.
    Accurate,
    /// Sampler-based addressing and filtering.
    Fast,
}

/// Mipmap enablement and filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapMode {
    Disabled,
    /// Snap to the nearest level.
    Nearest,
    /// Blend the two straddling levels.
    Interpolate,
}

impl MipmapMode {
    pub(crate) fn token(self) -> &'static str {
        match self {
            MipmapMode::Disabled => "disabled",
            MipmapMode::Nearest => "nearest",
            MipmapMode::Interpolate => "interpolate",
        }
    }
}

/// Number of combiner cycles the emulated hardware runs per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleMode {
    One,
    Two,
}

/// Source operand of a combiner cycle.
///
/// Each cycle computes `(a - b) * c + d` separately for color and alpha;
/// these are the values the four slots can select from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinerInput {
    /// Output of the previous cycle (zero in the first cycle).
    Combined,
    /// Texel fetched by unit 0.
    Texel0,
    /// Texel fetched by unit 1.
    Texel1,
    /// Primitive color register.
    Primitive,
    /// Interpolated vertex (shade) color.
    Shade,
    /// Environment color register.
    Environment,
    /// Primitive alpha broadcast.
    PrimitiveAlpha,
    /// Shade alpha broadcast.
    ShadeAlpha,
    /// Environment alpha broadcast.
    EnvironmentAlpha,
    /// LOD fraction register.
    LodFraction,
    One,
    Zero,
}

impl CombinerInput {
    fn uses_texel0(self) -> bool {
        self == CombinerInput::Texel0
    }

    fn uses_texel1(self) -> bool {
        self == CombinerInput::Texel1
    }
}

/// One `(a - b) * c + d` combine equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombinerCycle {
    pub a: CombinerInput,
    pub b: CombinerInput,
    pub c: CombinerInput,
    pub d: CombinerInput,
}

impl CombinerCycle {
    /// Cycle that passes `input` straight through.
    #[must_use]
    pub const fn passthrough(input: CombinerInput) -> Self {
        Self {
            a: CombinerInput::Zero,
            b: CombinerInput::Zero,
            c: CombinerInput::Zero,
            d: input,
        }
    }

    fn inputs(self) -> [CombinerInput; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// Resolved state of one texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureUnitState {
    pub enabled: bool,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub engine: ReadEngine,
}

impl TextureUnitState {
    /// A disabled unit. Addressing fields are fixed so that disabled units
    /// cannot introduce spurious descriptor inequality.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            wrap_s: WrapMode::Clamp,
            wrap_t: WrapMode::Clamp,
            engine: ReadEngine::Normal,
        }
    }

    /// An enabled unit on the standard read engine.
    #[must_use]
    pub const fn normal(wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        Self {
            enabled: true,
            wrap_s,
            wrap_t,
            engine: ReadEngine::Normal,
        }
    }
}

/// Full fixed-function state a shader program depends on.
///
/// Field-wise equality implies byte-identical generated source; the program
/// cache keys on this value directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinerDescriptor {
    pub tier: AccuracyTier,
    pub cycle_mode: CycleMode,
    pub units: [TextureUnitState; 2],
    pub mipmap: MipmapMode,
    /// First-cycle color equation.
    pub color0: CombinerCycle,
    /// First-cycle alpha equation.
    pub alpha0: CombinerCycle,
    /// Second-cycle equations, present exactly when `cycle_mode` is `Two`.
    pub color1: Option<CombinerCycle>,
    pub alpha1: Option<CombinerCycle>,
}

impl CombinerDescriptor {
    /// One-cycle descriptor with both units disabled.
    #[must_use]
    pub const fn new(tier: AccuracyTier, color0: CombinerCycle, alpha0: CombinerCycle) -> Self {
        Self {
            tier,
            cycle_mode: CycleMode::One,
            units: [TextureUnitState::disabled(), TextureUnitState::disabled()],
            mipmap: MipmapMode::Disabled,
            color0,
            alpha0,
            color1: None,
            alpha1: None,
        }
    }

    /// Copy-mode descriptor: unit 0 blits straight to the output.
    #[must_use]
    pub const fn copy_mode(tier: AccuracyTier) -> Self {
        Self {
            tier,
            cycle_mode: CycleMode::One,
            units: [
                TextureUnitState {
                    enabled: true,
                    wrap_s: WrapMode::Clamp,
                    wrap_t: WrapMode::Clamp,
                    engine: ReadEngine::CopyMode,
                },
                TextureUnitState::disabled(),
            ],
            mipmap: MipmapMode::Disabled,
            color0: CombinerCycle::passthrough(CombinerInput::Texel0),
            alpha0: CombinerCycle::passthrough(CombinerInput::Texel0),
            color1: None,
            alpha1: None,
        }
    }

    /// Whether any unit samples a texture.
    #[must_use]
    pub fn textured(&self) -> bool {
        self.units.iter().any(|u| u.enabled)
    }

    /// Whether this descriptor selects the copy-mode fast path.
    #[must_use]
    pub fn is_copy_mode(&self) -> bool {
        self.units[0].enabled && self.units[0].engine == ReadEngine::CopyMode
    }

    fn cycles(&self) -> impl Iterator<Item = CombinerCycle> + '_ {
        [Some(self.color0), Some(self.alpha0), self.color1, self.alpha1]
            .into_iter()
            .flatten()
    }

    /// Enforce the cross-field contract the upstream resolver guarantees.
    ///
    /// # Panics
    ///
    /// Panics on any violation; see the assertions for the rules. A broken
    /// descriptor is an upstream bug, not a recoverable condition.
    pub fn validate(&self) {
        let second_cycle = self.color1.is_some() && self.alpha1.is_some();
        let no_second_cycle = self.color1.is_none() && self.alpha1.is_none();
        match self.cycle_mode {
            CycleMode::One => assert!(
                no_second_cycle,
                "one-cycle descriptor carries second-cycle equations"
            ),
            CycleMode::Two => assert!(
                second_cycle,
                "two-cycle descriptor is missing second-cycle equations"
            ),
        }

        let copy0 = self.units[0].enabled && self.units[0].engine == ReadEngine::CopyMode;
        let copy1 = self.units[1].enabled && self.units[1].engine == ReadEngine::CopyMode;
        if copy0 || copy1 {
            assert!(
                copy0 && !self.units[1].enabled,
                "copy mode requires unit 0 in CopyMode and unit 1 disabled"
            );
        }

        if self.mipmap != MipmapMode::Disabled {
            assert!(
                self.units[0].enabled,
                "mipmapping requires texture unit 0 to be enabled"
            );
            assert!(!copy0, "mipmapping is meaningless in copy mode");
        }

        for cycle in self.cycles() {
            for input in cycle.inputs() {
                if input.uses_texel0() {
                    assert!(
                        self.units[0].enabled,
                        "combiner selects Texel0 but unit 0 is disabled"
                    );
                }
                if input.uses_texel1() {
                    assert!(
                        self.units[1].enabled,
                        "combiner selects Texel1 but unit 1 is disabled"
                    );
                }
            }
        }
    }
}
