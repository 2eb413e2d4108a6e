// THEORY:
// The `Pixel` module is the most fundamental unit of the sieve. It is a
// "dumb" data container for a single RGBA sample plus the three single-pixel
// predicates every filtering policy is built on: pure white, pure black and
// fully transparent.
//
// Key principles:
// 1) Single-pixel scope: classification never reads neighbors. Anything that
//    needs a neighborhood (the border flood fill) lives in `flood_fill`.
// 2) Classify once: the predicates are computed when the grid is scanned and
//    cached on the pixel, so the flood fill never re-derives them.
// 3) Test once: the validity state is memoized. The first `test()` settles it,
//    every later call only reports it.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Coordinate = u32;

    pub const CHANNELS: usize = 4;

    const CHANNEL_MAX: Channel = 255;
    const CHANNEL_MIN: Channel = 0;

    /// Filter state of a pixel. `Untested` pixels have not been visited by a filter yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum PixelState {
        #[default]
        Untested,
        Valid,
        Invalid,
    }

    /// The invalidity-causing classes a single RGBA sample falls into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Classification {
        pub white: bool,
        pub black: bool,
        pub transparent: bool,
    }

    impl Classification {
        pub fn classify(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                white: red == CHANNEL_MAX && green == CHANNEL_MAX && blue == CHANNEL_MAX,
                black: red == CHANNEL_MIN && green == CHANNEL_MIN && blue == CHANNEL_MIN,
                transparent: alpha == CHANNEL_MIN,
            }
        }

        /// True when the sample belongs to at least one excluded class.
        pub fn is_invalid(&self) -> bool {
            self.white || self.black || self.transparent
        }

        /// True when both samples belong to a common excluded class.
        pub fn shares_class(&self, other: &Classification) -> bool {
            (self.white && other.white)
                || (self.black && other.black)
                || (self.transparent && other.transparent)
        }
    }

    /// A single cell of a scanned image. Position and color are fixed at scan
    /// time; only the filter state changes afterwards.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Pixel {
        /// Column of the pixel, 0 at the left edge.
        x: Coordinate,
        /// Row of the pixel, 0 at the top edge.
        y: Coordinate,
        red: Channel,
        green: Channel,
        blue: Channel,
        alpha: Channel,
        classification: Classification,
        state: PixelState,
    }

    impl Pixel {
        pub fn new(x: Coordinate, y: Coordinate, rgba: [Channel; CHANNELS]) -> Self {
            let [red, green, blue, alpha] = rgba;
            Pixel {
                x,
                y,
                red,
                green,
                blue,
                alpha,
                classification: Classification::classify(red, green, blue, alpha),
                state: PixelState::Untested,
            }
        }

        pub fn x(&self) -> Coordinate {
            self.x
        }

        pub fn y(&self) -> Coordinate {
            self.y
        }

        pub fn rgba(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }

        pub fn classification(&self) -> Classification {
            self.classification
        }

        pub fn is_white(&self) -> bool {
            self.classification.white
        }

        pub fn is_black(&self) -> bool {
            self.classification.black
        }

        pub fn is_transparent(&self) -> bool {
            self.classification.transparent
        }

        pub fn state(&self) -> PixelState {
            self.state
        }

        pub fn is_tested(&self) -> bool {
            self.state != PixelState::Untested
        }

        /// Whether the pixel contributes to the average. Untested pixels count:
        /// only pixels a filter explicitly rejected are left out.
        pub fn counts(&self) -> bool {
            self.state != PixelState::Invalid
        }

        /// Settles the validity state on first call and reports it on every call.
        pub fn test(&mut self) -> PixelState {
            if self.state == PixelState::Untested {
                self.state = if self.classification.is_invalid() {
                    PixelState::Invalid
                } else {
                    PixelState::Valid
                };
            }
            self.state
        }

        #[cfg(test)]
        pub(crate) fn force_state(&mut self, state: PixelState) {
            self.state = state;
        }
    }

    impl From<(Coordinate, Coordinate, image::Rgba<Channel>)> for Pixel {
        fn from((x, y, sample): (Coordinate, Coordinate, image::Rgba<Channel>)) -> Self {
            Pixel::new(x, y, sample.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn classifies_pure_colors() {
        let white = Classification::classify(255, 255, 255, 255);
        assert!(white.white && !white.black && !white.transparent);

        let black = Classification::classify(0, 0, 0, 255);
        assert!(black.black && !black.white);

        let clear = Classification::classify(12, 200, 40, 0);
        assert!(clear.transparent && clear.is_invalid());

        let near_white = Classification::classify(255, 255, 254, 255);
        assert!(!near_white.is_invalid());
    }

    #[test]
    fn transparent_white_belongs_to_two_classes() {
        let sample = Classification::classify(255, 255, 255, 0);
        assert!(sample.white && sample.transparent);
        assert!(sample.shares_class(&Classification::classify(1, 2, 3, 0)));
        assert!(!sample.shares_class(&Classification::classify(0, 0, 0, 255)));
    }

    #[test]
    fn test_is_memoized() {
        let mut pixel = Pixel::new(3, 4, [255, 255, 255, 255]);
        assert!(!pixel.is_tested());
        assert_eq!(pixel.test(), PixelState::Invalid);

        pixel.force_state(PixelState::Valid);
        assert_eq!(pixel.test(), PixelState::Valid);
        assert!(pixel.counts());
    }

    #[test]
    fn position_and_color_are_read_only() {
        let pixel = Pixel::from((7, 2, image::Rgba([255, 255, 255, 0])));
        assert_eq!((pixel.x(), pixel.y()), (7, 2));
        assert_eq!(pixel.rgba(), [255, 255, 255, 0]);
        assert!(pixel.is_white() && pixel.is_transparent() && !pixel.is_black());
    }

    #[test]
    fn untested_pixels_count() {
        let pixel = Pixel::new(0, 0, [0, 0, 0, 0]);
        assert_eq!(pixel.state(), PixelState::Untested);
        assert!(pixel.counts());
    }
}
