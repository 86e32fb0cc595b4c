//! Per-slot orientation
//!
//! The resolver turns the request flags into a [`TransformSpec`] for each
//! slot position. It is a pure function of its inputs; the compositor
//! applies the result to both the PDF page and the preview bitmap.

use crate::options::RotateRule;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Orientation flags carried by a single booklet request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformFlags {
    pub rotate_all: bool,
    pub rotate: bool,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

/// Resolved instruction for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSpec {
    pub rotation: Rotation,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Half of the sheet the slot content is drawn into
    pub half: Half,
}

impl TransformSpec {
    pub fn identity(half: Half) -> Self {
        Self {
            rotation: Rotation::None,
            flip_horizontal: false,
            flip_vertical: false,
            half,
        }
    }
}

/// Resolves slot transforms for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformResolver {
    pub flags: TransformFlags,
    pub rule: RotateRule,
}

impl TransformResolver {
    pub fn new(flags: TransformFlags, rule: RotateRule) -> Self {
        Self { flags, rule }
    }

    pub fn resolve(&self, position: SlotPosition) -> TransformSpec {
        resolve(position, self.flags, self.rule)
    }
}

/// Compute the transform for the slot at `position`.
///
/// Mirroring is applied before rotation. `rotate_all` turns every slot in
/// place; `rotate` turns the slots selected by `rule`.
pub fn resolve(position: SlotPosition, flags: TransformFlags, rule: RotateRule) -> TransformSpec {
    let mut spec = TransformSpec {
        flip_horizontal: flags.flip_horizontal,
        flip_vertical: flags.flip_vertical,
        ..TransformSpec::identity(position.half)
    };

    if flags.rotate_all {
        spec.rotation = spec.rotation.then(Rotation::Clockwise180);
    }

    if flags.rotate {
        match rule {
            RotateRule::BackSide => {
                if position.face == Face::Back {
                    spec.rotation = spec.rotation.then(Rotation::Clockwise180);
                    spec.half = position.half.opposite();
                }
            }
            RotateRule::LeftSlots => {
                if position.half == Half::Left {
                    spec.rotation = spec.rotation.then(Rotation::Clockwise180);
                }
            }
            RotateRule::Slot(target) => {
                if position == target {
                    spec.rotation = spec.rotation.then(Rotation::Clockwise180);
                }
            }
        }
    }

    spec
}

/// 2-D affine matrix in PDF `cm` operand order.
///
/// A point maps as `x' = a·x + c·y + e`, `y' = b·x + d·y + f` (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(s: f32) -> Self {
        Self {
            a: s,
            d: s,
            ..Self::IDENTITY
        }
    }

    /// Mirror about the origin's vertical and/or horizontal axis
    pub fn mirror(horizontal: bool, vertical: bool) -> Self {
        Self {
            a: if horizontal { -1.0 } else { 1.0 },
            d: if vertical { -1.0 } else { 1.0 },
            ..Self::IDENTITY
        }
    }

    /// Rotate clockwise (as seen on the page) about the origin
    pub fn rotate(rotation: Rotation) -> Self {
        let (cos, sin) = match rotation {
            Rotation::None => (1.0, 0.0),
            Rotation::Clockwise90 => (0.0, 1.0),
            Rotation::Clockwise180 => (-1.0, 0.0),
            Rotation::Clockwise270 => (0.0, -1.0),
        };
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` followed by `next`
    pub fn then(self, next: Affine) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Operands for a PDF `cm` operator
    pub fn to_cm(&self) -> String {
        format!(
            "{} {} {} {} {} {} cm",
            fmt_num(self.a),
            fmt_num(self.b),
            fmt_num(self.c),
            fmt_num(self.d),
            fmt_num(self.e),
            fmt_num(self.f)
        )
    }
}

/// Compact number formatting for content streams (no `-0`, no exponent)
fn fmt_num(v: f32) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_POSITIONS: [SlotPosition; 4] = [
        SlotPosition::FRONT_LEFT,
        SlotPosition::FRONT_RIGHT,
        SlotPosition::BACK_LEFT,
        SlotPosition::BACK_RIGHT,
    ];

    fn flags(rotate_all: bool, rotate: bool, h: bool, v: bool) -> TransformFlags {
        TransformFlags {
            rotate_all,
            rotate,
            flip_horizontal: h,
            flip_vertical: v,
        }
    }

    #[test]
    fn test_default_flags_are_identity() {
        for pos in ALL_POSITIONS {
            let spec = resolve(pos, TransformFlags::default(), RotateRule::BackSide);
            assert_eq!(spec, TransformSpec::identity(pos.half));
        }
    }

    #[test]
    fn test_rotate_all_turns_every_slot_in_place() {
        for pos in ALL_POSITIONS {
            let spec = resolve(pos, flags(true, false, false, false), RotateRule::BackSide);
            assert_eq!(spec.rotation, Rotation::Clockwise180);
            assert_eq!(spec.half, pos.half);
        }
    }

    #[test]
    fn test_rotate_back_side_turns_whole_face() {
        let f = flags(false, true, false, false);
        let front = resolve(SlotPosition::FRONT_LEFT, f, RotateRule::BackSide);
        assert_eq!(front, TransformSpec::identity(Half::Left));

        let back_left = resolve(SlotPosition::BACK_LEFT, f, RotateRule::BackSide);
        assert_eq!(back_left.rotation, Rotation::Clockwise180);
        assert_eq!(back_left.half, Half::Right);
    }

    #[test]
    fn test_rotate_single_slot_rule() {
        let f = flags(false, true, false, false);
        let rule = RotateRule::Slot(SlotPosition::FRONT_LEFT);
        let rotated: Vec<_> = ALL_POSITIONS
            .iter()
            .filter(|p| resolve(**p, f, rule).rotation != Rotation::None)
            .collect();
        assert_eq!(rotated, vec![&SlotPosition::FRONT_LEFT]);
    }

    #[test]
    fn test_rotate_and_rotate_all_cancel() {
        let spec = resolve(
            SlotPosition::FRONT_LEFT,
            flags(true, true, false, false),
            RotateRule::LeftSlots,
        );
        assert_eq!(spec.rotation, Rotation::None);
    }

    #[test]
    fn test_flip_never_changes_rotation() {
        for pos in ALL_POSITIONS {
            for rotate_all in [false, true] {
                for rotate in [false, true] {
                    let plain = resolve(pos, flags(rotate_all, rotate, false, false), RotateRule::BackSide);
                    let flipped = resolve(pos, flags(rotate_all, rotate, true, false), RotateRule::BackSide);
                    assert_eq!(plain.rotation, flipped.rotation);
                    assert_eq!(plain.half, flipped.half);
                    assert!(flipped.flip_horizontal);
                }
            }
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let f = flags(true, true, true, true);
        for pos in ALL_POSITIONS {
            assert_eq!(resolve(pos, f, RotateRule::BackSide), resolve(pos, f, RotateRule::BackSide));
        }
    }

    #[test]
    fn test_affine_rotation_is_clockwise() {
        // Top of the page (0, 1) should end up on the right (1, 0)
        let (x, y) = Affine::rotate(Rotation::Clockwise90).apply(0.0, 1.0);
        assert!((x - 1.0).abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_affine_composition_order() {
        let m = Affine::translate(10.0, 0.0).then(Affine::scale(2.0));
        assert_eq!(m.apply(0.0, 0.0), (20.0, 0.0));
        let m = Affine::scale(2.0).then(Affine::translate(10.0, 0.0));
        assert_eq!(m.apply(0.0, 0.0), (10.0, 0.0));
    }

    #[test]
    fn test_cm_formatting() {
        let m = Affine::rotate(Rotation::Clockwise180).then(Affine::translate(1.5, 2.0));
        assert_eq!(m.to_cm(), "-1 0 0 -1 1.5 2 cm");
    }
}
