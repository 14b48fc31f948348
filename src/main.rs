//! VitaClock firmware — main entry point.
//!
//! Hexagonal architecture with a cooperative single-threaded loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  EspHardware      LogEventSink    NvsAlarmStore          │
//! │  (Clock+Sensor    (EventSink)     (AlarmStorePort)       │
//! │   +Buzzer)        Lcd1602         MonotonicClock         │
//! │                                                          │
//! │  ────────────── Port Trait Boundary ──────────────       │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │            AppService (pure logic)             │      │
//! │  │  input · modes · alarm · health · audio        │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every pass of the loop feeds one monotonic timestamp through the
//! service tick; the only blocking call is the fixed end-of-pass delay.

#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::FromValueType;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use vitaclock::adapters::hardware::{EspHardware, Lcd1602};
use vitaclock::adapters::log_sink::LogEventSink;
use vitaclock::adapters::nvs::NvsAlarmStore;
use vitaclock::adapters::time::MonotonicClock;
use vitaclock::app::events::{AppEvent, TelemetryData};
use vitaclock::app::ports::{ClockPort, EventSink};
use vitaclock::app::service::AppService;
use vitaclock::config::SystemConfig;
use vitaclock::{presentation, remote};

/// Loop pass period. Well under the 50ms debounce window so no press
/// edge is ever missed.
const TICK_MS: u32 = 20;

/// Display redraw cadence between forced refreshes (keeps the seconds
/// field of the clock row moving).
const REDRAW_MS: u64 = 250;

/// Event sink for the binary: logs everything and holds back the latest
/// telemetry snapshot so the loop can publish a remote status report.
struct MainSink {
    log: LogEventSink,
    pending_telemetry: Option<TelemetryData>,
}

impl EventSink for MainSink {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        if let AppEvent::Telemetry(t) = event {
            self.pending_telemetry = Some(*t);
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().map_err(|e| anyhow!("logger init failed: {e:?}"))?;

    info!("VitaClock v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals =
        Peripherals::take().map_err(|e| anyhow!("peripherals unavailable: {e}"))?;
    let pins = peripherals.pins;

    // Sensors + RTC share I2C0; the LCD backpack sits alone on I2C1.
    let sensor_bus = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio21,
        pins.gpio22,
        &I2cConfig::new().baudrate(400u32.kHz().into()),
    )?;
    let lcd_bus = I2cDriver::new(
        peripherals.i2c1,
        pins.gpio25,
        pins.gpio26,
        &I2cConfig::new().baudrate(100u32.kHz().into()),
    )?;

    let mut button = PinDriver::input(pins.gpio4.downgrade())?;
    button.set_pull(esp_idf_svc::hal::gpio::Pull::Up)?;
    let buzzer = PinDriver::output(pins.gpio18.downgrade())?;

    let mut hw = EspHardware::new(sensor_bus, button, buzzer)
        .map_err(|e| anyhow!("hardware init failed: {e}"))?;
    let mut lcd = Lcd1602::new(lcd_bus).map_err(|e| anyhow!("LCD init failed: {e}"))?;

    // ── 3. Persistence + service ──────────────────────────────
    let store = NvsAlarmStore::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = SystemConfig::default();
    let mut service = AppService::boot(config, &store);

    let clock = MonotonicClock::new();
    let mut sink = MainSink {
        log: LogEventSink::new(),
        pending_telemetry: None,
    };
    service.start(clock.now_ms(), &mut sink);

    // ── 4. WiFi (optional — the appliance is fully local-first) ──
    let mut wifi = connect_wifi(peripherals.modem);

    // ── 5. Cooperative loop ───────────────────────────────────
    let mut last_draw_ms = 0u64;
    loop {
        let now_ms = clock.now_ms();
        hw.set_now(now_ms);

        let online = wifi.as_ref().is_some_and(|w| w.is_connected().unwrap_or(false));
        service.set_connectivity(online, &mut sink);

        service.tick(now_ms, &mut hw, &mut sink);

        // Remote status publication piggybacks on the telemetry cadence.
        if let Some(telemetry) = sink.pending_telemetry.take() {
            let report = remote::status_report(&service.snapshot(), &telemetry);
            match remote::encode_report(&report) {
                Ok(json) => info!("REMOTE| {json}"),
                Err(e) => warn!("REMOTE| encode failed: {e}"),
            }
        }

        if service.take_refresh() || now_ms.saturating_sub(last_draw_ms) >= REDRAW_MS {
            last_draw_ms = now_ms;
            let snapshot = service.snapshot();
            let frame = presentation::render(
                &snapshot,
                hw.time_of_day(),
                hw.date(),
                service.environment(),
                service.last_pulse(),
                now_ms,
            );
            lcd.draw(&frame);
        }

        FreeRtos::delay_ms(TICK_MS);
    }
}

/// Try to bring WiFi up from compile-time credentials. Missing
/// credentials or a failed join leave the appliance in local-only
/// operation; nothing downstream depends on being online.
fn connect_wifi(
    modem: esp_idf_svc::hal::modem::Modem,
) -> Option<BlockingWifi<EspWifi<'static>>> {
    let (Some(ssid), Some(pass)) = (option_env!("VITACLOCK_SSID"), option_env!("VITACLOCK_PASS"))
    else {
        info!("no WiFi credentials baked in, staying offline");
        return None;
    };

    let result = (|| -> Result<BlockingWifi<EspWifi<'static>>> {
        let sysloop = EspSystemEventLoop::take()?;
        let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), None)?, sysloop)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|()| anyhow!("SSID too long"))?,
            password: pass
                .try_into()
                .map_err(|()| anyhow!("password too long"))?,
            ..Default::default()
        }))?;
        wifi.start()?;
        wifi.connect()?;
        wifi.wait_netif_up()?;
        Ok(wifi)
    })();

    match result {
        Ok(wifi) => {
            info!("WiFi connected to '{ssid}'");
            Some(wifi)
        }
        Err(e) => {
            warn!("WiFi join failed ({e}), staying offline");
            None
        }
    }
}
