//! End-to-end orchestrator behavior against mock modems, rigs, and sinks.

use std::sync::Arc;
use std::time::Duration;

use linkdial::{ConnOutcome, Config, DialEvent, Dialer, DialerBuilder, Frequency, RigTable, Scheme};
use linkdial_test_harness::{
    DialBehavior, MockModemFactory, MockRig, RecordingEventLog, RecordingExchange,
    RecordingStatus,
};
use tokio::sync::broadcast;

struct Fixture {
    dialer: Arc<Dialer>,
    modems: Arc<MockModemFactory>,
    rig: Arc<MockRig>,
    status: Arc<RecordingStatus>,
    events: Arc<RecordingEventLog>,
    exchange: Arc<RecordingExchange>,
}

fn khz(k: u64) -> Frequency {
    Frequency::from_hz(k * 1000)
}

fn config() -> Config {
    let mut config = Config::default();
    config.mycall = "LA5NTA".into();
    config.ardop.rig = "ic7300".into();
    config.varahf.rig = "ic7300".into();
    config
}

fn fixture(config: Config) -> Fixture {
    fixture_with_settle(config, Duration::ZERO)
}

fn fixture_with_settle(config: Config, settle: Duration) -> Fixture {
    let modems = Arc::new(MockModemFactory::new());
    let rig = Arc::new(MockRig::new("ic7300", khz(7101)));
    let status = Arc::new(RecordingStatus::new());
    let events = Arc::new(RecordingEventLog::new());
    let exchange = Arc::new(RecordingExchange::new());

    let mut rigs = RigTable::from_config(&config);
    rigs.insert("ic7300", rig.clone());

    let dialer = DialerBuilder::new(config, exchange.clone())
        .modem_factory(modems.clone())
        .rigs(Arc::new(rigs))
        .status_sink(status.clone())
        .event_log(events.clone())
        .qsy_settle(settle)
        .qsx_delay(Duration::ZERO)
        .busy_poll(Duration::from_millis(1))
        .build();

    Fixture {
        dialer: Arc::new(dialer),
        modems,
        rig,
        status,
        events,
        exchange,
    }
}

async fn wait_for_frequency(rig: &MockRig, freq: Frequency) {
    for _ in 0..500 {
        if rig.frequency() == freq {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("rig never reached {freq}");
}

async fn wait_until_dialing_to(dialer: &Dialer, target: &str) {
    for _ in 0..1000 {
        if dialer.dialing().is_some_and(|d| d.target() == target) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("dial to {target} never started");
}

async fn wait_until_dialing(dialer: &Dialer) {
    for _ in 0..1000 {
        if dialer.dialing().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("dial never started");
}

#[tokio::test]
async fn unparsable_descriptors_have_no_side_effects() {
    let f = fixture(config());
    for bad in [
        "",
        "LA1B",
        "://LA1B",
        "winmor://LA1B?freq=3585",
        "ardop://?freq=3585",
        "ardop://LA1B?=3585",
        "telnet://host:port/LA1B",
    ] {
        assert!(!f.dialer.connect(bad).await, "{bad:?} should not connect");
    }
    assert_eq!(f.modems.open_count(), 0);
    assert!(f.rig.set_log().is_empty());
    assert!(f.events.records().is_empty());
    assert!(f.status.changes().is_empty());
}

#[tokio::test]
async fn freq_without_rig_fails_before_dial() {
    let mut config = config();
    config.varafm.rig = "ft991".into();
    let f = fixture(config);

    assert!(!f.dialer.connect("pactor://LA1B?freq=3585").await);
    assert!(!f.dialer.connect("varafm://LA1B?freq=145050").await);

    for modem in f.modems.opened() {
        assert_eq!(modem.dials_started(), 0);
    }
    assert!(f.rig.set_log().is_empty());
    assert!(f.events.records().is_empty());
}

#[tokio::test]
async fn invalid_freq_fails_before_dial() {
    let f = fixture(config());
    assert!(!f.dialer.connect("ardop://LA1B?freq=abc").await);
    assert_eq!(f.modems.last().unwrap().dials_started(), 0);
    assert!(f.rig.set_log().is_empty());
}

#[tokio::test]
async fn successful_dial_reverts_qsy_and_runs_exchange() {
    let f = fixture(config());

    assert!(f.dialer.connect("ardop://LA1B?freq=3585").await);

    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101)]);
    assert_eq!(f.rig.frequency(), khz(7101));
    assert_eq!(f.exchange.targets(), vec!["LA1B".to_string()]);

    let records = f.events.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].descriptor, "ardop://LA1B?freq=3585");
    assert_eq!(records[0].frequency, Some(khz(3585)));
    assert_eq!(
        records[0].outcome,
        ConnOutcome::Connected {
            remote: "LA1B".into()
        }
    );

    let changes = f.status.changes();
    assert_eq!(changes.len(), 2);
    assert!(changes[0].as_deref().unwrap().contains("LA1B"));
    assert_eq!(changes[1], None);
}

#[tokio::test]
async fn failed_dial_reverts_qsy() {
    let f = fixture(config());
    f.modems
        .set_dial_behavior(DialBehavior::Fail("no answer".into()));

    assert!(!f.dialer.connect("varahf://LA1B?freq=3585").await);

    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101)]);
    assert!(f.exchange.targets().is_empty());
    assert!(matches!(
        f.events.records()[0].outcome,
        ConnOutcome::Failed { ref error } if error.contains("no answer")
    ));
    assert_eq!(f.status.current(), None);
}

#[tokio::test]
async fn qsy_failure_leaves_no_dial() {
    let f = fixture(config());
    f.rig.fail_set(true);

    assert!(!f.dialer.connect("ardop://LA1B?freq=3585").await);
    assert_eq!(f.modems.last().unwrap().dials_started(), 0);
    assert!(f.events.records().is_empty());
}

#[tokio::test]
async fn cancelled_dial_reverts_and_leaves_modem_reusable() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);

    let task = f.dialer.start("ardop://LA1B?freq=3585");
    wait_until_dialing(&f.dialer).await;
    assert!(f.status.current().is_some());

    task.abort();
    assert!(!task.wait().await);

    assert_eq!(f.dialer.dialing(), None);
    assert_eq!(f.status.current(), None);
    assert_eq!(f.rig.frequency(), khz(7101));
    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101)]);
    assert_eq!(f.events.records()[0].outcome, ConnOutcome::Cancelled);

    let modem = f.modems.last().unwrap();
    modem.set_dial_behavior(DialBehavior::Connect);
    assert!(f.dialer.connect("ardop://LA1B").await);
    assert_eq!(f.modems.open_count(), 1);
    assert_eq!(modem.close_count(), 0);
}

#[tokio::test]
async fn dialer_abort_cancels_active_dial() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);
    assert!(!f.dialer.abort());

    let task = f.dialer.start("telnet://LA1B");
    wait_until_dialing(&f.dialer).await;
    let handle = f.dialer.abort_handle().unwrap();

    assert!(f.dialer.abort());
    assert!(!task.wait().await);
    assert!(handle.is_aborted());
    assert!(!f.dialer.abort());
}

#[tokio::test]
async fn abort_before_dial_starts_is_honored() {
    let f = fixture(config());
    f.modems.set_busy_polls(1_000);

    let task = f.dialer.start("ardop://LA1B");
    task.abort();

    assert!(!task.wait().await);
    assert!(f.modems.last().map_or(true, |m| m.dials().is_empty()));
    assert_eq!(f.dialer.dialing(), None);
}

#[tokio::test]
async fn stale_abort_handle_does_not_touch_next_dial() {
    let f = fixture(config());

    let first = f.dialer.start("telnet://LA1B");
    let stale = first.abort_handle();
    assert!(first.wait().await);

    f.modems.last().unwrap().set_dial_behavior(DialBehavior::Hang);
    let second = f.dialer.start("telnet://LA1B");
    wait_until_dialing(&f.dialer).await;

    stale.abort();
    assert!(f.dialer.dialing().is_some());

    second.abort();
    assert!(!second.wait().await);
}

#[tokio::test]
async fn replacing_a_qsy_dial_reverts_before_retuning() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);

    let first = f.dialer.start("ardop://LA1B?freq=3585");
    wait_until_dialing_to(&f.dialer, "LA1B").await;

    let second = f.dialer.start("ardop://LA2B?freq=14105");
    assert!(!first.wait().await);
    wait_until_dialing_to(&f.dialer, "LA2B").await;

    // The first dial's QSX ran before the second QSY, not under it.
    assert_eq!(f.rig.frequency(), khz(14105));
    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101), khz(14105)]);
    assert_eq!(f.modems.open_count(), 1);

    second.abort();
    assert!(!second.wait().await);
    assert_eq!(f.rig.frequency(), khz(7101));
    assert_eq!(
        f.rig.set_log(),
        vec![khz(3585), khz(7101), khz(14105), khz(7101)]
    );
}

#[tokio::test]
async fn replaced_dial_reverts_exactly_once() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);

    let first = f.dialer.start("ardop://LA1B?freq=3585");
    wait_until_dialing_to(&f.dialer, "LA1B").await;

    f.modems.last().unwrap().set_dial_behavior(DialBehavior::Connect);
    assert!(f.dialer.connect("ardop://LA2B?freq=14105").await);
    assert!(!first.wait().await);

    assert_eq!(
        f.rig.set_log(),
        vec![khz(3585), khz(7101), khz(14105), khz(7101)]
    );
    assert_eq!(f.exchange.targets(), vec!["LA2B".to_string()]);
    assert_eq!(f.dialer.dialing(), None);
}

#[tokio::test]
async fn dial_replaced_while_settling_never_dials() {
    let f = fixture_with_settle(config(), Duration::from_millis(100));

    let first = f.dialer.start("ardop://LA1B?freq=3585");
    wait_for_frequency(&f.rig, khz(3585)).await;

    assert!(f.dialer.connect("ardop://LA2B?freq=14105").await);
    assert!(!first.wait().await);

    let modem = f.modems.last().unwrap();
    assert_eq!(modem.dials_started(), 1);
    assert_eq!(f.exchange.targets(), vec!["LA2B".to_string()]);
    assert_eq!(
        f.rig.set_log(),
        vec![khz(3585), khz(7101), khz(14105), khz(7101)]
    );
}

#[tokio::test]
async fn connect_dropped_during_settle_still_reverts() {
    let f = fixture_with_settle(config(), Duration::from_millis(300));

    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        f.dialer.connect("ardop://LA1B?freq=3585"),
    )
    .await;
    assert!(dropped.is_err());

    wait_for_frequency(&f.rig, khz(7101)).await;
    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101)]);
    assert_eq!(f.modems.last().unwrap().dials_started(), 0);
    assert_eq!(f.dialer.dialing(), None);

    // The session was released with the dropped future.
    assert!(f.dialer.connect("telnet://LA1B").await);
}

#[tokio::test]
async fn abort_while_settling_reverts_without_dialing() {
    let f = fixture_with_settle(config(), Duration::from_millis(100));

    let task = f.dialer.start_any(vec!["ardop://LA1B?freq=3585".into(), "telnet://LA1B".into()]);
    wait_for_frequency(&f.rig, khz(3585)).await;
    assert_eq!(f.dialer.dialing(), None);

    task.abort();
    assert!(!task.wait().await);
    assert_eq!(f.rig.set_log(), vec![khz(3585), khz(7101)]);
    assert!(f.events.records().is_empty());
    assert!(f.exchange.targets().is_empty());
}

#[tokio::test]
async fn new_dial_cancels_previous() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);

    let first = f.dialer.start("ardop://LA1B");
    wait_until_dialing(&f.dialer).await;

    f.modems.set_dial_behavior(DialBehavior::Connect);
    assert!(f.dialer.connect("telnet://LA2B").await);
    assert!(!first.wait().await);
    assert_eq!(f.dialer.dialing(), None);
    assert_eq!(f.status.current(), None);
}

#[tokio::test]
async fn radio_only_with_ssid_contacts_nothing() {
    let mut config = config();
    config.mycall = "LA5NTA-10".into();
    let f = fixture(config);

    assert!(!f.dialer.connect("ardop://LA1B?radio_only=true&freq=3585").await);
    assert_eq!(f.modems.open_count(), 0);
    assert!(f.rig.set_log().is_empty());
}

#[tokio::test]
async fn global_radio_only_with_ssid_contacts_nothing() {
    let mut config = config();
    config.mycall = "LA5NTA-10".into();
    config.radio_only = true;
    let f = fixture(config);

    assert!(!f.dialer.connect("varahf://LA1B").await);
    assert_eq!(f.modems.open_count(), 0);
}

#[tokio::test]
async fn radio_only_on_packet_schemes_contacts_nothing() {
    let f = fixture(config());

    assert!(!f.dialer.connect("ax25://LA1B?radio_only=1").await);
    assert!(!f.dialer.connect("serial-tnc://LA1B?radio_only=t").await);
    assert_eq!(f.modems.open_count(), 0);
}

#[tokio::test]
async fn radio_only_appends_suffix() {
    let f = fixture(config());

    assert!(f.dialer.connect("ardop://LA1B?radio_only=true").await);
    assert!(f.dialer.connect("ardop://LA1B?radio_only=bogus").await);

    let dials = f.modems.last().unwrap().dials();
    assert_eq!(dials[0].user(), Some("LA5NTA-T"));
    assert_eq!(dials[1].user(), Some("LA5NTA"));
}

#[tokio::test]
async fn empty_radio_only_falls_back_to_global() {
    let f = fixture(config());
    assert!(f.dialer.connect("ardop://LA1B?radio_only").await);
    assert!(f.dialer.connect("ardop://LA1B?radio_only=").await);
    for dial in f.modems.last().unwrap().dials() {
        assert_eq!(dial.user(), Some("LA5NTA"));
    }

    let mut global = config();
    global.radio_only = true;
    let f = fixture(global);
    assert!(f.dialer.connect("ardop://LA1B?radio_only=").await);
    assert_eq!(f.modems.last().unwrap().dials()[0].user(), Some("LA5NTA-T"));
    assert!(!f.dialer.connect("ax25://LA1B?radio_only").await);
}

#[tokio::test]
async fn per_descriptor_override_beats_global_radio_only() {
    let mut config = config();
    config.radio_only = true;
    let f = fixture(config);

    assert!(f.dialer.connect("ax25://LA1B?radio_only=false").await);
    let dial = &f.modems.last().unwrap().dials()[0];
    assert_eq!(dial.user(), Some("LA5NTA"));
    assert_eq!(dial.host(), "wl2k");
}

#[tokio::test]
async fn connect_any_stops_at_first_success() {
    let f = fixture(config());

    assert!(
        f.dialer
            .connect_any(&["not a descriptor", "telnet://LA1B", "ardop://LA2B"])
            .await
    );

    assert_eq!(f.exchange.targets(), vec!["LA1B".to_string()]);
    assert!(f.modems.opened_for(Scheme::Ardop).is_empty());
}

#[tokio::test]
async fn connect_any_with_nothing_to_try() {
    let f = fixture(config());
    let none: [&str; 0] = [];
    assert!(!f.dialer.connect_any(&none).await);
}

#[tokio::test]
async fn connect_any_falls_through_failures() {
    let f = fixture(config());
    f.modems.fail_open(Scheme::VaraHf);

    assert!(
        f.dialer
            .connect_any(&["varahf://LA1B".to_string(), "telnet://LA1B".to_string()])
            .await
    );
    assert_eq!(f.events.records().len(), 1);
}

#[tokio::test]
async fn connect_any_stops_when_aborted() {
    let f = fixture(config());
    f.modems.set_dial_behavior(DialBehavior::Hang);

    let dialer = f.dialer.clone();
    let task = tokio::spawn(async move {
        dialer
            .connect_any(&["ardop://LA1B", "telnet://LA1B"])
            .await
    });
    wait_until_dialing(&f.dialer).await;
    assert!(f.dialer.abort());

    assert!(!task.await.unwrap());
    assert!(f.modems.opened_for(Scheme::Telnet).is_empty());
}

#[tokio::test]
async fn healthy_modem_is_reused_and_unhealthy_replaced() {
    let f = fixture(config());

    assert!(f.dialer.connect("ardop://LA1B").await);
    assert!(f.dialer.connect("ardop://LA2B").await);
    assert_eq!(f.modems.open_count(), 1);

    let first = f.modems.last().unwrap();
    first.set_healthy(false);
    assert!(f.dialer.connect("ardop://LA1B").await);

    assert_eq!(f.modems.open_count(), 2);
    assert_eq!(first.close_count(), 1);
}

#[tokio::test]
async fn init_failure_aborts_before_qsy() {
    let f = fixture(config());
    f.modems.fail_open(Scheme::VaraHf);

    assert!(!f.dialer.connect("varahf://LA1B?freq=3585").await);
    assert!(f.rig.set_log().is_empty());
    assert!(f.status.changes().is_empty());
}

#[tokio::test]
async fn busy_channel_is_waited_out() {
    let f = fixture(config());
    f.modems.set_busy_polls(3);

    assert!(f.dialer.connect("ardop://LA1B").await);
    assert_eq!(f.modems.last().unwrap().busy_queries(), 4);
}

#[tokio::test]
async fn ignore_busy_param_dials_immediately() {
    let f = fixture(config());
    f.modems.set_busy_polls(1_000);

    assert!(f.dialer.connect("ardop://LA1B?ignore_busy=true").await);
    assert_eq!(f.modems.last().unwrap().busy_queries(), 1);
}

#[tokio::test]
async fn unshared_medium_skips_busy_gate() {
    let f = fixture(config());
    f.modems.set_busy_polls(1_000);

    assert!(f.dialer.connect("telnet://LA1B").await);
    assert_eq!(f.modems.last().unwrap().busy_queries(), 0);
}

#[tokio::test]
async fn exchange_failure_is_connect_failure() {
    let f = fixture(config());
    f.exchange.set_fail(true);

    assert!(!f.dialer.connect("telnet://LA1B").await);
    assert!(matches!(
        f.events.records()[0].outcome,
        ConnOutcome::Connected { .. }
    ));
}

#[tokio::test]
async fn aliases_resolve_before_parse() {
    let mut config = config();
    config
        .connect_aliases
        .insert("home".into(), "hf".into());
    config
        .connect_aliases
        .insert("hf".into(), "varahf://LA1B?freq=3585".into());
    config.connect_aliases.insert("loop".into(), "loop".into());
    let f = fixture(config);

    assert!(f.dialer.connect("home").await);
    assert_eq!(f.events.records()[0].descriptor, "varahf://LA1B?freq=3585");

    assert!(!f.dialer.connect("loop").await);
    assert_eq!(f.modems.open_count(), 1);
}

#[tokio::test]
async fn pactor_init_change_reopens_modem() {
    let f = fixture(config());

    assert!(f.dialer.connect("pactor://LA1B?init=TONES+4").await);
    assert!(f.dialer.connect("pactor://LA1B?init=TONES+4").await);
    assert!(f.dialer.connect("pactor://LA1B?init=TONES+2").await);

    let opened = f.modems.opened_for(Scheme::Pactor);
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[0].close_count(), 1);
    assert_eq!(opened[1].settings().init_commands.as_deref(), Some("TONES 2"));
}

#[tokio::test]
async fn ptt_rig_is_wired_when_enabled() {
    let mut config = config();
    config.ardop.ptt_control = true;
    config.ardop.arq_bandwidth = Some("500MAX".into());
    let f = fixture(config);

    assert!(f.dialer.connect("ardop://LA1B").await);
    let modem = f.modems.last().unwrap();
    assert_eq!(modem.ptt_rig().as_deref(), Some("ic7300"));
    assert_eq!(modem.arq_bandwidth().as_deref(), Some("500MAX"));
    assert_eq!(modem.cwid(), Some(true));
}

#[tokio::test]
async fn ptt_control_without_rig_fails_modem_init() {
    let mut config = config();
    config.ardop.ptt_control = true;
    config.ardop.rig.clear();
    let f = fixture(config);

    assert!(!f.dialer.connect("ardop://LA1B").await);
    assert_eq!(f.modems.open_count(), 0);
    assert!(f.events.records().is_empty());
}

#[tokio::test]
async fn shutdown_closes_every_modem_once() {
    let f = fixture(config());
    assert!(f.dialer.connect("ardop://LA1B").await);
    assert!(f.dialer.connect("telnet://LA1B").await);

    f.dialer.shutdown().await;
    f.dialer.shutdown().await;

    assert!(f.modems.opened().iter().all(|m| m.close_count() == 1));
}

#[tokio::test]
async fn broadcast_status_sink() {
    let (tx, mut rx) = broadcast::channel(8);
    let dialer = DialerBuilder::new(config(), Arc::new(RecordingExchange::new()))
        .modem_factory(Arc::new(MockModemFactory::new()))
        .status_sink(Arc::new(tx))
        .build();

    assert!(dialer.connect("telnet://LA1B").await);

    match rx.recv().await.unwrap() {
        DialEvent::DialingStarted { descriptor } => {
            assert_eq!(descriptor.target(), "LA1B");
            assert_eq!(descriptor.user(), Some("LA5NTA"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), DialEvent::DialingEnded);
}
