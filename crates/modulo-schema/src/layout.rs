//! Physical layout: linear strip or 2-D matrix, and the logical->physical
//! index mapping used identically by the preview evaluator and the firmware
//! emitter (the parity contract requires they share this, not re-derive it).

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Tl,
    Tr,
    Bl,
    Br,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Rotate {
    R0 = 0,
    R90 = 90,
    R180 = 180,
    R270 = 270,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Strip {
        count: u32,
        led_pin: u8,
    },
    Cells {
        width: u32,
        height: u32,
        #[serde(default)]
        serpentine: bool,
        #[serde(default = "default_origin")]
        origin: Origin,
        #[serde(default = "default_rotate")]
        rotate: Rotate,
        #[serde(default)]
        flip_x: bool,
        #[serde(default)]
        flip_y: bool,
    },
}

fn default_origin() -> Origin {
    Origin::Tl
}

fn default_rotate() -> Rotate {
    Rotate::R0
}

impl Layout {
    pub fn num_leds(&self) -> u32 {
        match self {
            Layout::Strip { count, .. } => *count,
            Layout::Cells { width, height, .. } => width * height,
        }
    }

    pub fn validate(&self) -> SchemaResult<()> {
        match self {
            Layout::Strip { count, .. } => {
                if *count == 0 {
                    return Err(SchemaError::InvalidLayout("strip count must be > 0".into()));
                }
            }
            Layout::Cells { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(SchemaError::InvalidLayout(
                        "cells width/height must be > 0".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Map a logical pixel index `i` (row-major, unrotated, unflipped) to the
    /// physical index written into the framebuffer. Identity for `Strip`.
    /// Must be a bijection over `[0, num_leds())` for `Cells` — see
    /// `modulo_map_index` tests below and the emitter's `@@MATRIX_IMPL@@`.
    pub fn map_index(&self, i: u32) -> u32 {
        match self {
            Layout::Strip { .. } => i,
            Layout::Cells {
                width,
                height,
                serpentine,
                origin,
                rotate,
                flip_x,
                flip_y,
            } => {
                let (w, h) = (*width, *height);
                let mut x = i % w;
                let mut y = i / w;

                // rotate within the logical w x h grid
                let (rw, rh, rx, ry) = match rotate {
                    Rotate::R0 => (w, h, x, y),
                    Rotate::R90 => (h, w, h - 1 - y, x),
                    Rotate::R180 => (w, h, w - 1 - x, h - 1 - y),
                    Rotate::R270 => (h, w, y, w - 1 - x),
                };
                x = rx;
                y = ry;
                let (w, h) = (rw, rh);

                if *flip_x {
                    x = w - 1 - x;
                }
                if *flip_y {
                    y = h - 1 - y;
                }

                match origin {
                    Origin::Tl => {}
                    Origin::Tr => x = w - 1 - x,
                    Origin::Bl => y = h - 1 - y,
                    Origin::Br => {
                        x = w - 1 - x;
                        y = h - 1 - y;
                    }
                }

                let row_x = if *serpentine && y % 2 == 1 { w - 1 - x } else { x };
                y * w + row_x
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn strip_mapping_is_identity() {
        let l = Layout::Strip { count: 8, led_pin: 6 };
        for i in 0..8 {
            assert_eq!(l.map_index(i), i);
        }
    }

    #[test]
    fn cells_mapping_is_bijective_for_all_transform_combos() {
        let origins = [Origin::Tl, Origin::Tr, Origin::Bl, Origin::Br];
        let rotates = [Rotate::R0, Rotate::R90, Rotate::R180, Rotate::R270];
        for origin in origins {
            for rotate in rotates {
                for flip_x in [false, true] {
                    for flip_y in [false, true] {
                        for serpentine in [false, true] {
                            let l = Layout::Cells {
                                width: 16,
                                height: 8,
                                serpentine,
                                origin,
                                rotate,
                                flip_x,
                                flip_y,
                            };
                            let n = l.num_leds();
                            let mut seen = HashSet::new();
                            for i in 0..n {
                                let p = l.map_index(i);
                                assert!(p < n, "out of range mapping");
                                assert!(seen.insert(p), "mapping not injective");
                            }
                            assert_eq!(seen.len(), n as usize);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn serpentine_row1_is_reversed() {
        let l = Layout::Cells {
            width: 16,
            height: 8,
            serpentine: true,
            origin: Origin::Tl,
            rotate: Rotate::R0,
            flip_x: false,
            flip_y: false,
        };
        // row 1 logical indices 16..32 should map to reversed column order
        let row1: Vec<u32> = (16..32).map(|i| l.map_index(i)).collect();
        let expected: Vec<u32> = (16..32).rev().collect();
        assert_eq!(row1, expected);
    }
}
