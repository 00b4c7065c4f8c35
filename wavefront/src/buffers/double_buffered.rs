/// A pair of resources used alternately as the source and the destination of
/// consecutive bounces.
///
/// Incoming and outgoing sides are always two different fields, so a bounce
/// can't accidentally read from the stream it writes into.
#[derive(Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl<T> DoubleBuffered<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Creates both sides using given constructor, which receives `"a"` or
    /// `"b"` as the side's suffix.
    pub fn try_new<E>(
        mut f: impl FnMut(&'static str) -> Result<T, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            a: f("a")?,
            b: f("b")?,
        })
    }

    pub fn get(&self, alternate: bool) -> &T {
        if alternate {
            &self.b
        } else {
            &self.a
        }
    }

    /// Returns the slot addressed by given parity, i.e. `slot & 1`.
    pub fn slot(&self, slot: u32) -> &T {
        self.get(slot & 1 == 1)
    }

    /// Returns the side given bounce reads from.
    pub fn incoming(&self, bounce: u32) -> &T {
        self.slot(bounce)
    }

    /// Returns the side given bounce writes into.
    ///
    /// See: [`Self::incoming()`].
    pub fn outgoing(&self, bounce: u32) -> &T {
        self.slot(bounce.wrapping_add(1))
    }

    /// Returns `(incoming, outgoing)` for given bounce.
    pub fn split(&self, bounce: u32) -> (&T, &T) {
        (self.incoming(bounce), self.outgoing(bounce))
    }
}
