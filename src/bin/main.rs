#![no_std]
#![no_main]

use cortex_m::peripheral::SCB;
use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::adc::{self, Adc};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::Pwm;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Ticker};
use heli_rig::output::TELEMETRY_BAUDRATE;
use heli_rig::{
    ButtonLatch, ButtonPanel, CodeLatch, EncoderPins, Flag, IndexPin, InterruptFlags,
    PanelInputs, PanelOutputs, RigConfig, RotorPwm, SampleChannel, SampleQueue, Sampler,
    Scheduler, StatusChannel, StatusQueue, SwitchLevel, SwitchPin, TelemetryUart, DEFAULT_CONFIG,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
    ADC_IRQ_FIFO => embassy_rp::adc::InterruptHandler;
});

/// Panel buttons are polled at this rate; a press needs
/// [`DEBOUNCE_POLLS`](heli_rig::input::DEBOUNCE_POLLS) stable reads.
const BUTTON_POLL_HZ: u64 = 100;

type RigScheduler = Scheduler<'static, PanelInputs<'static>, PanelOutputs<'static>, Delay>;

/// Sticky flags raised by the shim tasks and taken by the scheduler.
static FLAGS: InterruptFlags = InterruptFlags::new();

static CODE: CodeLatch = CodeLatch::new();
static SWITCH: SwitchLevel = SwitchLevel::new();
static BUTTONS: ButtonLatch = ButtonLatch::new();

/// Raw height samples, sampler task to scheduler.
static SAMPLES: StaticCell<SampleChannel> = StaticCell::new();
/// Status records, scheduler to UART task.
static STATUS: StaticCell<StatusChannel> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("heli-rig starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());
    let config = DEFAULT_CONFIG;

    let samples: &'static SampleChannel = SAMPLES.init(Channel::new());
    let status: &'static StatusChannel = STATUS.init(Channel::new());

    // --- Height sensor ---
    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let height = adc::Channel::new_pin(p.PIN_26, Pull::None);
    let sampler = Sampler::new(adc, height, samples.sender());

    // --- Yaw encoder ---
    let encoder = EncoderPins::new(Input::new(p.PIN_2, Pull::Up), Input::new(p.PIN_3, Pull::Up));
    // The scheduler seeds its tracker from this code
    CODE.store(encoder.code());
    let index = IndexPin::new(Input::new(p.PIN_4, Pull::Up));

    // --- Panel ---
    let switch = SwitchPin::new(Input::new(p.PIN_5, Pull::Down));
    SWITCH.store(switch.position());
    let reset = Input::new(p.PIN_6, Pull::Up);
    let buttons = ButtonPanel::new(
        Input::new(p.PIN_10, Pull::Up),
        Input::new(p.PIN_11, Pull::Up),
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
    );

    // --- Rotors ---
    let rotors = RotorPwm::new(
        Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, RotorPwm::config()),
        Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, RotorPwm::config()),
    );

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = TELEMETRY_BAUDRATE;

    let uart = Uart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, _rx) = uart.split();

    let inputs = PanelInputs::new(
        SampleQueue::new(samples.receiver()),
        &CODE,
        &SWITCH,
        &BUTTONS,
        reset,
    );
    let outputs = PanelOutputs::new(rotors, StatusQueue::new(status.sender()));

    spawner.spawn(sampler_task(sampler, config.timing.sample_rate_hz).unwrap());
    spawner.spawn(tick_task(config.timing.tick_rate_hz).unwrap());
    spawner.spawn(quadrature_task(encoder).unwrap());
    spawner.spawn(index_task(index).unwrap());
    spawner.spawn(switch_task(switch).unwrap());
    spawner.spawn(button_task(buttons).unwrap());
    spawner.spawn(telemetry_task(TelemetryUart::new(tx), status).unwrap());
    spawner.spawn(control_task(inputs, outputs, config).unwrap());

    info!("heli-rig initialized, calibrating altitude...");
}

/// Sampler task - one ADC conversion per period into the sample queue.
#[embassy_executor::task]
async fn sampler_task(mut sampler: Sampler<'static>, rate_hz: u32) {
    let mut ticker = Ticker::every(Duration::from_hz(u64::from(rate_hz)));
    let mut reported = 0;
    loop {
        ticker.next().await;
        if let Err(e) = sampler.sample().await {
            error!("ADC error: {:?}", e);
        }
        if sampler.overruns() != reported {
            reported = sampler.overruns();
            warn!("Sample queue full ({} dropped)", reported);
        }
    }
}

/// Tick task - raises the control tick flag.
#[embassy_executor::task]
async fn tick_task(rate_hz: u32) {
    let mut ticker = Ticker::every(Duration::from_hz(u64::from(rate_hz)));
    loop {
        ticker.next().await;
        FLAGS.raise(Flag::Tick);
    }
}

/// Quadrature task - captures the channel code on every edge.
#[embassy_executor::task]
async fn quadrature_task(mut encoder: EncoderPins<'static>) {
    loop {
        let code = encoder.next_edge().await;
        CODE.store(code);
        FLAGS.raise(Flag::QuadratureEdge);
    }
}

/// Index task - signals the yaw reference marker.
#[embassy_executor::task]
async fn index_task(mut index: IndexPin<'static>) {
    loop {
        index.wait_for_marker().await;
        FLAGS.raise(Flag::YawReference);
    }
}

/// Switch task - stores the mode switch level and signals the edge.
#[embassy_executor::task]
async fn switch_task(mut switch: SwitchPin<'static>) {
    loop {
        let position = switch.next_change().await;
        SWITCH.store(position);
        FLAGS.raise(Flag::ModeSwitch);
    }
}

/// Button task - polls and debounces the panel.
#[embassy_executor::task]
async fn button_task(mut buttons: ButtonPanel<'static>) {
    let mut ticker = Ticker::every(Duration::from_hz(BUTTON_POLL_HZ));
    loop {
        ticker.next().await;
        buttons.poll(&BUTTONS);
    }
}

/// Telemetry task - drains status records onto the UART.
#[embassy_executor::task]
async fn telemetry_task(mut uart: TelemetryUart<'static>, status: &'static StatusChannel) {
    loop {
        let frame = status.receive().await;
        if let Err(e) = uart.write_status(&frame).await {
            error!("Telemetry error: {:?}", e);
        }
    }
}

/// Control task - runs the scheduler until a restart is requested.
#[embassy_executor::task]
async fn control_task(
    inputs: PanelInputs<'static>,
    outputs: PanelOutputs<'static>,
    config: RigConfig,
) {
    let scheduler: Result<RigScheduler, _> =
        Scheduler::new(config, &FLAGS, inputs, outputs, Delay);
    let mut scheduler = match scheduler {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Rig configuration rejected: {}", e);
            return;
        }
    };

    while scheduler.dispatch().is_ok() {
        yield_now().await;
    }

    info!("Restart requested, resetting...");
    SCB::sys_reset();
}
