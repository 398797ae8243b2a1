//! PS/2 device-to-host transport state machine.

use emu_core::{Observable, Tickable, Ticks, Value};

use crate::queue::ByteQueue;

/// DATA line bit in the host/device signal masks.
pub const DATA_MASK: u8 = 0x01;
/// CLK line bit in the host/device signal masks.
pub const CLK_MASK: u8 = 0x02;
/// Host has released both lines: the device may transmit.
pub const HOST_IDLE: u8 = DATA_MASK | CLK_MASK;

/// Bus cycles per half bit cell (25 x ~3 cycles at 8 MHz = ~75 us).
pub const HOLD: u32 = 25 * 8;

/// Outbound bytes buffered per port.
pub const QUEUE_CAPACITY: usize = 32;

/// Transport phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Between frames. Output is "not ready" until a byte is loaded.
    Ready,
    /// Device pulls CLK low and presents the current bit on DATA.
    SendLow,
    /// Device releases CLK.
    SendHigh,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Ready => "Ready",
            State::SendLow => "SendLow",
            State::SendHigh => "SendHigh",
        }
    }
}

/// Build the 11-bit frame for a byte: start bit (0) in bit 0, data in bits
/// 1-8, odd parity in bit 9, stop bit (1) in bit 10.
#[must_use]
pub fn frame_for(byte: u8) -> u16 {
    let parity = u16::from(byte.count_ones() % 2 == 0);
    (u16::from(byte) << 1) | (parity << 9) | (1 << 10)
}

/// One PS/2 port as seen from the device side.
#[derive(Debug, Clone)]
pub struct Ps2Port {
    /// Transport phase.
    state: State,
    /// Byte being transmitted; kept so an inhibited frame can be resent.
    current_byte: u8,
    /// Remaining frame bits, LSB next. Zero when no byte is in flight.
    frame: u16,
    /// Cycles spent in the current phase.
    send_time: u32,
    /// Lines released by the host (1 = released).
    host_in: u8,
    /// Bytes waiting to be sent.
    queue: ByteQueue<QUEUE_CAPACITY>,
}

impl Ps2Port {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ready,
            current_byte: 0,
            frame: 0,
            send_time: 0,
            host_in: HOST_IDLE,
            queue: ByteQueue::new(),
        }
    }

    /// Queue a byte for transmission. Dropped silently if the queue is full.
    pub fn enqueue(&mut self, byte: u8) {
        if !self.queue.push(byte) {
            tracing::trace!(byte, "ps2 queue full, byte dropped");
        }
    }

    /// Free queue slots.
    #[must_use]
    pub fn queue_remaining(&self) -> usize {
        self.queue.remaining()
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Bytes waiting to be sent, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = u8> + '_ {
        self.queue.iter()
    }

    /// Set the lines released by the host (`DATA_MASK`/`CLK_MASK` bits).
    pub fn set_host_input(&mut self, mask: u8) {
        self.host_in = mask & HOST_IDLE;
    }

    #[must_use]
    pub fn host_input(&self) -> u8 {
        self.host_in
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Lines released by the device, derived from the current phase.
    #[must_use]
    pub fn output(&self) -> u8 {
        match self.host_in {
            HOST_IDLE => match self.state {
                State::SendLow => (self.frame & 1) as u8,
                State::Ready | State::SendHigh => CLK_MASK,
            },
            // Inhibited, or a combination the protocol does not define.
            _ => 0,
        }
    }

    /// Advance by `cycles` bus cycles.
    ///
    /// Identical to calling `advance(1)` `cycles` times: surplus cycles at
    /// the end of a phase roll over into the next one. A host inhibit resets
    /// the port to `Ready` on entry, whatever `cycles` is.
    pub fn advance(&mut self, cycles: u64) {
        match self.host_in {
            HOST_IDLE => {}
            DATA_MASK => {
                // Host holds CLK low: abort the frame, keep the byte. Applies
                // even when no time has passed.
                self.state = State::Ready;
                return;
            }
            _ => return,
        }
        if cycles == 0 {
            return;
        }

        let mut remaining = cycles;
        while remaining > 0 {
            match self.state {
                State::Ready => {
                    if self.frame == 0 {
                        let Some(byte) = self.queue.pop() else {
                            return;
                        };
                        self.current_byte = byte;
                    }
                    self.frame = frame_for(self.current_byte);
                    self.send_time = 0;
                    self.state = State::SendLow;
                }
                State::SendLow => {
                    if self.consume_phase(&mut remaining) {
                        self.frame >>= 1;
                        self.state = State::SendHigh;
                    }
                }
                State::SendHigh => {
                    if self.consume_phase(&mut remaining) {
                        self.state = if self.frame != 0 {
                            State::SendLow
                        } else {
                            State::Ready
                        };
                    }
                }
            }
        }
    }

    /// Spend cycles on the current phase. Returns true when the phase has
    /// lasted `HOLD` cycles, with the phase timer reset for the next one.
    fn consume_phase(&mut self, remaining: &mut u64) -> bool {
        let left = u64::from(HOLD - self.send_time);
        let step = (*remaining).min(left);
        self.send_time += step as u32;
        *remaining -= step;
        if self.send_time == HOLD {
            self.send_time = 0;
            true
        } else {
            false
        }
    }
}

impl Default for Ps2Port {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Ps2Port {
    fn tick(&mut self) {
        self.advance(1);
    }

    fn tick_n(&mut self, count: Ticks) {
        self.advance(count.get());
    }
}

impl Observable for Ps2Port {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "state" => Some(self.state.name().into()),
            "queue_len" => Some((self.queue.len() as u64).into()),
            "host_in" => Some(self.host_in.into()),
            "out" => Some(self.output().into()),
            "frame" => Some(self.frame.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["state", "queue_len", "host_in", "out", "frame"]
    }
}
