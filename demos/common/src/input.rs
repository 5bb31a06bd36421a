//! Polled keyboard state and edge-triggered toggles.
//!
//! Platforms sample the keyboard once per frame and hand over a [`HeldKeys`] snapshot. Continuous controls (camera,
//! shading parameters) act every frame a key is held; switches go through a [`Toggle`], which flips once per
//! press-release cycle no matter how many frames the key stays down.

/// Keys the demos react to: ASCII letters and the space bar.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
  A,
  B,
  C,
  D,
  E,
  F,
  G,
  H,
  I,
  J,
  K,
  L,
  M,
  N,
  O,
  P,
  Q,
  R,
  S,
  T,
  U,
  V,
  W,
  X,
  Y,
  Z,
  Space,
}

impl Key {
  /// Every key, in declaration order.
  pub const ALL: [Key; 27] = [
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
    Key::G,
    Key::H,
    Key::I,
    Key::J,
    Key::K,
    Key::L,
    Key::M,
    Key::N,
    Key::O,
    Key::P,
    Key::Q,
    Key::R,
    Key::S,
    Key::T,
    Key::U,
    Key::V,
    Key::W,
    Key::X,
    Key::Y,
    Key::Z,
    Key::Space,
  ];

  /// Map an ASCII character (either case) or `' '` to a key.
  pub fn from_char(c: char) -> Option<Self> {
    if c == ' ' {
      return Some(Key::Space);
    }

    if c.is_ascii_alphabetic() {
      let index = (c.to_ascii_uppercase() as u8 - b'A') as usize;
      Self::ALL.get(index).copied()
    } else {
      None
    }
  }

  fn bit(self) -> u32 {
    1 << (self as u32)
  }
}

/// Set of keys held down during a frame.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct HeldKeys(u32);

impl HeldKeys {
  /// No key held.
  pub fn none() -> Self {
    Self::default()
  }

  /// Mark a key as held.
  pub fn press(&mut self, key: Key) {
    self.0 |= key.bit();
  }

  /// Builder version of [`HeldKeys::press`].
  pub fn with(mut self, key: Key) -> Self {
    self.press(key);
    self
  }

  pub fn is_held(&self, key: Key) -> bool {
    self.0 & key.bit() != 0
  }
}

impl FromIterator<Key> for HeldKeys {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Key>,
  {
    iter.into_iter().fold(HeldKeys::none(), HeldKeys::with)
  }
}

/// A boolean flag flipped by a key, with its debounce latch.
///
/// The flag flips on the frame the key goes down; the latch then holds until a frame sees the key up again.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Toggle {
  value: bool,
  latched: bool,
}

impl Toggle {
  pub fn new(value: bool) -> Self {
    Self {
      value,
      latched: false,
    }
  }

  pub fn value(&self) -> bool {
    self.value
  }

  /// Feed the key state for this frame. Returns `true` if the flag flipped.
  pub fn update(&mut self, held: bool) -> bool {
    match (held, self.latched) {
      (true, false) => {
        self.value = !self.value;
        self.latched = true;
        true
      }

      (false, true) => {
        self.latched = false;
        false
      }

      _ => false,
    }
  }
}
