use serde::{Deserialize, Serialize};

/// Opaque color expressed as byte RGB channels.
///
/// Serialized as a three element array so palette entries read naturally in
/// settings files (`normal_color = [230, 230, 230]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self(red, green, blue)
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.0
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.1
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.2
    }

    /// Mixes two colors, keeping `weight` of `self` and `1 - weight` of `other`.
    #[must_use]
    pub fn blend(self, other: Rgb, weight: f32) -> Self {
        let weight = weight.clamp(0.0, 1.0);
        Self(
            blend_channel(self.0, other.0, weight),
            blend_channel(self.1, other.1, weight),
            blend_channel(self.2, other.2, weight),
        )
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        self.blend(Self(255, 255, 255), 1.0 - amount.clamp(0.0, 1.0))
    }
}

fn blend_channel(first: u8, second: u8, weight: f32) -> u8 {
    let mixed = f32::from(first) * weight + f32::from(second) * (1.0 - weight);
    mixed.round().clamp(0.0, 255.0) as u8
}
