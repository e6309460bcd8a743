//! Temporal trail: an exponential blend with the previous frame (§4.8).

use modulo_operator::Rgb;

/// `out := prev * trail + current * (1 - trail)`, per channel.
pub fn trail(prev: &[Rgb], current: &[Rgb], amount: f32) -> Vec<Rgb> {
    let amount = amount.clamp(0.0, 1.0);
    current
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let p = prev.get(i).copied().unwrap_or([0.0, 0.0, 0.0]);
            [p[0] * amount + c[0] * (1.0 - amount), p[1] * amount + c[1] * (1.0 - amount), p[2] * amount + c[2] * (1.0 - amount)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trail_is_current_frame() {
        let prev = vec![[255.0, 255.0, 255.0]];
        let current = vec![[0.0, 0.0, 0.0]];
        assert_eq!(trail(&prev, &current, 0.0), current);
    }

    #[test]
    fn full_trail_is_previous_frame() {
        let prev = vec![[255.0, 0.0, 0.0]];
        let current = vec![[0.0, 255.0, 0.0]];
        assert_eq!(trail(&prev, &current, 1.0), prev);
    }

    #[test]
    fn shorter_previous_frame_treated_as_black() {
        let prev: Vec<Rgb> = vec![];
        let current = vec![[100.0, 0.0, 0.0]];
        let out = trail(&prev, &current, 0.5);
        assert_eq!(out[0], [50.0, 0.0, 0.0]);
    }
}
