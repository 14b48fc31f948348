//! Hardware adapter — bridges real peripherals to the domain ports.
//!
//! This is the only module that touches actual hardware: the DS3231
//! RTC, the AHT20 environment sensor and the MAX30102 pulse front-end
//! share one I2C bus; the button and buzzer are plain GPIOs. On
//! non-espidf targets [`SimHardware`] provides an injectable stand-in
//! that implements the same port traits, so the full coordinator stack
//! runs on the host.

#[cfg(not(target_os = "espidf"))]
pub use sim::SimHardware;

#[cfg(target_os = "espidf")]
pub use esp::{EspHardware, Lcd1602};

// ───────────────────────────────────────────────────────────────
// Host simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use crate::alarm::{Date, TimeOfDay};
    use crate::app::ports::{BuzzerPort, ClockPort, SensorPort};
    use crate::sensors::{EnvReading, PulseReading};

    /// Injectable hardware stand-in. Fields are public so driving code
    /// (demos, integration tests) can script readings directly.
    #[derive(Debug, Default)]
    pub struct SimHardware {
        pub tod: TimeOfDay,
        pub date: Date,
        pub env: Option<EnvReading>,
        pub pulse: PulseReading,
        pub button: bool,
        /// Last level written to the buzzer line.
        pub buzzer: bool,
    }

    impl SimHardware {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ClockPort for SimHardware {
        fn time_of_day(&mut self) -> TimeOfDay {
            self.tod
        }
        fn date(&mut self) -> Date {
            self.date
        }
    }

    impl SensorPort for SimHardware {
        fn read_environment(&mut self) -> Option<EnvReading> {
            self.env
        }
        fn read_pulse(&mut self) -> PulseReading {
            self.pulse
        }
        fn button_pressed(&mut self) -> bool {
            self.button
        }
    }

    impl BuzzerPort for SimHardware {
        fn set(&mut self, on: bool) {
            self.buzzer = on;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP32 backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::delay::{FreeRtos, BLOCK};
    use esp_idf_svc::hal::gpio::{AnyIOPin, Input, Output, PinDriver};
    use esp_idf_svc::hal::i2c::I2cDriver;
    use log::warn;

    use crate::alarm::{Date, TimeOfDay};
    use crate::app::ports::{BuzzerPort, ClockPort, SensorPort};
    use crate::sensors::{EnvReading, PulseProcessor, PulseReading};

    const DS3231_ADDR: u8 = 0x68;
    const AHT20_ADDR: u8 = 0x38;
    const MAX30102_ADDR: u8 = 0x57;

    /// IR delta above the running baseline that counts as a beat edge.
    const BEAT_THRESHOLD: i32 = 1200;

    fn bcd_to_bin(b: u8) -> u8 {
        (b >> 4) * 10 + (b & 0x0F)
    }

    /// All peripherals behind the domain ports. The button is wired
    /// active-low with the internal pull-up.
    pub struct EspHardware<'d> {
        i2c: I2cDriver<'d>,
        button: PinDriver<'d, AnyIOPin, Input>,
        buzzer: PinDriver<'d, AnyIOPin, Output>,
        pulse: PulseProcessor,
        ir_baseline: i32,
        above_threshold: bool,
        now_ms: u64,
    }

    impl<'d> EspHardware<'d> {
        pub fn new(
            i2c: I2cDriver<'d>,
            button: PinDriver<'d, AnyIOPin, Input>,
            buzzer: PinDriver<'d, AnyIOPin, Output>,
        ) -> Result<Self, crate::error::Error> {
            let mut hw = Self {
                i2c,
                button,
                buzzer,
                pulse: PulseProcessor::new(),
                ir_baseline: 0,
                above_threshold: false,
                now_ms: 0,
            };
            hw.init_max30102()
                .map_err(|_| crate::error::Error::Init("MAX30102 setup failed"))?;
            Ok(hw)
        }

        /// Monotonic timestamp fed into the pulse collaborator. Called
        /// once per loop pass by the binary before the service tick.
        pub fn set_now(&mut self, now_ms: u64) {
            self.now_ms = now_ms;
        }

        fn init_max30102(&mut self) -> Result<(), esp_idf_svc::sys::EspError> {
            // Reset, then SpO2 mode, 100 Hz, 411us pulse width, mid LED current.
            self.i2c.write(MAX30102_ADDR, &[0x09, 0x40], BLOCK)?;
            FreeRtos::delay_ms(10);
            self.i2c.write(MAX30102_ADDR, &[0x09, 0x03], BLOCK)?;
            self.i2c.write(MAX30102_ADDR, &[0x0A, 0x27], BLOCK)?;
            self.i2c.write(MAX30102_ADDR, &[0x0C, 0x24], BLOCK)?;
            self.i2c.write(MAX30102_ADDR, &[0x0D, 0x24], BLOCK)?;
            Ok(())
        }

        fn read_ir(&mut self) -> Option<u32> {
            // One FIFO sample: 3 bytes red, 3 bytes IR, 18-bit values.
            let mut fifo = [0u8; 6];
            self.i2c
                .write_read(MAX30102_ADDR, &[0x07], &mut fifo, BLOCK)
                .ok()?;
            let ir = ((fifo[3] as u32) << 16 | (fifo[4] as u32) << 8 | fifo[5] as u32) & 0x3FFFF;
            Some(ir)
        }

        /// Rising-edge beat detector over a slow IR baseline.
        fn detect_beat(&mut self, ir: u32) -> bool {
            let ir = ir as i32;
            if self.ir_baseline == 0 {
                self.ir_baseline = ir;
                return false;
            }
            self.ir_baseline += (ir - self.ir_baseline) / 16;
            let above = ir - self.ir_baseline > BEAT_THRESHOLD;
            let beat = above && !self.above_threshold;
            self.above_threshold = above;
            beat
        }
    }

    impl ClockPort for EspHardware<'_> {
        fn time_of_day(&mut self) -> TimeOfDay {
            let mut regs = [0u8; 3];
            if let Err(e) = self.i2c.write_read(DS3231_ADDR, &[0x00], &mut regs, BLOCK) {
                warn!("DS3231 time read failed: {e}");
                return TimeOfDay::default();
            }
            TimeOfDay {
                second: bcd_to_bin(regs[0] & 0x7F),
                minute: bcd_to_bin(regs[1]),
                hour: bcd_to_bin(regs[2] & 0x3F),
            }
        }

        fn date(&mut self) -> Date {
            let mut regs = [0u8; 3];
            if let Err(e) = self.i2c.write_read(DS3231_ADDR, &[0x04], &mut regs, BLOCK) {
                warn!("DS3231 date read failed: {e}");
                return Date::default();
            }
            Date {
                day: bcd_to_bin(regs[0]),
                month: bcd_to_bin(regs[1] & 0x1F),
                year: 2000 + bcd_to_bin(regs[2]) as u16,
            }
        }
    }

    impl SensorPort for EspHardware<'_> {
        fn read_environment(&mut self) -> Option<EnvReading> {
            // AHT20 triggered measurement, ~80ms conversion.
            self.i2c
                .write(AHT20_ADDR, &[0xAC, 0x33, 0x00], BLOCK)
                .ok()?;
            FreeRtos::delay_ms(80);
            let mut data = [0u8; 6];
            self.i2c.read(AHT20_ADDR, &mut data, BLOCK).ok()?;
            if data[0] & 0x80 != 0 {
                return None;
            }
            let raw_h = (data[1] as u32) << 12 | (data[2] as u32) << 4 | (data[3] as u32) >> 4;
            let raw_t = ((data[3] as u32) & 0x0F) << 16 | (data[4] as u32) << 8 | data[5] as u32;
            Some(EnvReading {
                humidity: raw_h as f32 / (1 << 20) as f32 * 100.0,
                temperature_c: raw_t as f32 / (1 << 20) as f32 * 200.0 - 50.0,
            })
        }

        fn read_pulse(&mut self) -> PulseReading {
            let Some(ir) = self.read_ir() else {
                return PulseReading::default();
            };
            let beat = self.detect_beat(ir);
            let now = self.now_ms;
            self.pulse.sample(ir, beat, now)
        }

        fn button_pressed(&mut self) -> bool {
            self.button.is_low()
        }
    }

    impl BuzzerPort for EspHardware<'_> {
        fn set(&mut self, on: bool) {
            let result = if on {
                self.buzzer.set_high()
            } else {
                self.buzzer.set_low()
            };
            if let Err(e) = result {
                warn!("buzzer write failed: {e}");
            }
        }
    }

    // ───────────────────────────────────────────────────────────────
    // 16×2 character LCD behind a PCF8574 I2C backpack
    // ───────────────────────────────────────────────────────────────

    const LCD_ADDR: u8 = 0x27;
    const LCD_BACKLIGHT: u8 = 0x08;
    const LCD_ENABLE: u8 = 0x04;

    pub struct Lcd1602<'d> {
        i2c: I2cDriver<'d>,
    }

    impl<'d> Lcd1602<'d> {
        pub fn new(i2c: I2cDriver<'d>) -> Result<Self, crate::error::Error> {
            let mut lcd = Self { i2c };
            lcd.init()
                .map_err(|_| crate::error::Error::Init("LCD init failed"))?;
            Ok(lcd)
        }

        fn init(&mut self) -> Result<(), esp_idf_svc::sys::EspError> {
            FreeRtos::delay_ms(50);
            // 4-bit mode entry sequence per HD44780 datasheet.
            for _ in 0..3 {
                self.write_nibble(0x30, false)?;
                FreeRtos::delay_ms(5);
            }
            self.write_nibble(0x20, false)?;
            self.command(0x28)?; // 4-bit, 2 lines, 5x8 font
            self.command(0x0C)?; // display on, cursor off
            self.command(0x01)?; // clear
            FreeRtos::delay_ms(2);
            Ok(())
        }

        fn write_nibble(&mut self, data: u8, rs: bool) -> Result<(), esp_idf_svc::sys::EspError> {
            let byte = (data & 0xF0) | LCD_BACKLIGHT | if rs { 0x01 } else { 0x00 };
            self.i2c.write(LCD_ADDR, &[byte | LCD_ENABLE], BLOCK)?;
            self.i2c.write(LCD_ADDR, &[byte], BLOCK)?;
            Ok(())
        }

        fn write_byte(&mut self, data: u8, rs: bool) -> Result<(), esp_idf_svc::sys::EspError> {
            self.write_nibble(data, rs)?;
            self.write_nibble(data << 4, rs)
        }

        fn command(&mut self, cmd: u8) -> Result<(), esp_idf_svc::sys::EspError> {
            self.write_byte(cmd, false)
        }

        /// Draw a full frame, padding each row to 16 columns.
        pub fn draw(&mut self, frame: &crate::presentation::Frame) {
            for (row, line) in [(0u8, &frame.line0), (1u8, &frame.line1)] {
                let addr = if row == 0 { 0x80 } else { 0xC0 };
                if self.command(addr).is_err() {
                    warn!("LCD row address write failed");
                    return;
                }
                let mut written = 0;
                for ch in line.chars() {
                    let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
                    if self.write_byte(byte, true).is_err() {
                        return;
                    }
                    written += 1;
                }
                for _ in written..16 {
                    if self.write_byte(b' ', true).is_err() {
                        return;
                    }
                }
            }
        }
    }
}
