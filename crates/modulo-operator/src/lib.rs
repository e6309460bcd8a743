//! Operator chain: gain, gamma, and posterize, applied per layer, per pixel,
//! pre-blend (§4.4). The chain is bounded to two exported slots; a slot
//! mirroring the layer's behavior key as a no-op sentinel is skipped.

use modulo_schema::layer::Operator;

pub type Rgb = [f32; 3];

/// Run `rgb` (channels in `[0,255]`) through the operator chain in slot
/// order. Sentinel no-op operators (slot 0 mirroring the behavior key) are
/// filtered out by the caller before this is invoked — this function just
/// applies whatever it's given, in order.
pub fn apply_chain(ops: &[Operator], rgb: Rgb) -> Rgb {
    let mut out = rgb;
    for op in ops {
        out = [op.apply(out[0]), op.apply(out[1]), op.apply(out[2])];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_identity() {
        assert_eq!(apply_chain(&[], [10.0, 20.0, 30.0]), [10.0, 20.0, 30.0]);
    }

    #[test]
    fn chain_applies_in_order() {
        let ops = [Operator::Gain { k: 2.0 }, Operator::Posterize { levels: 2 }];
        let out = apply_chain(&ops, [100.0, 100.0, 100.0]);
        assert!(out[0] == 0.0 || out[0] == 255.0);
    }
}
