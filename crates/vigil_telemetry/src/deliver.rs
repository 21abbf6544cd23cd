//! Store-and-forward delivery of staged files.
//!
//! A file reaches this module from a `transmit` directory. Delivery runs in
//! three steps: make sure the transceiver is powered and answering
//! ([`ensure_transceiver`]), confirm the far end is reachable, then hand the
//! file to rsync (LAN) or curl (long-haul). The local copy is removed only
//! after the transfer command reports success, so a failed or interrupted
//! transfer leaves the file staged for the next pass.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::config::{RelayConfig, TelemetryConfig, TransportMode};
use crate::error::{Result, TelemetryError};
use crate::relay::{self, SwitchState};

/// Reachability probing and power control for the backhaul link.
///
/// Split out as a trait so the power-cycle sequencing can be tested without
/// a physical relay on the bench.
pub trait LinkControl {
    /// Probe a host, returning the ping exit status (0 = reachable).
    fn probe(&self, ip: &str) -> i32;

    /// Close the relay switch powering the transceiver.
    fn power_on(&self, channel: u8) -> i32;
}

/// The production [`LinkControl`]: ping plus the HTTP relay.
pub struct RelayLink<'a> {
    pub relay: &'a RelayConfig,
}

impl LinkControl for RelayLink<'_> {
    fn probe(&self, ip: &str) -> i32 {
        vigil_exec::ping(ip, 3)
    }

    fn power_on(&self, channel: u8) -> i32 {
        relay::set_state(self.relay, channel, SwitchState::Closed)
    }
}

/// Make sure the transceiver answers pings, powering it on at most once.
///
/// The transceiver is normally left unpowered between passes to save the
/// node's power budget. One power-on and one re-probe is the whole recovery
/// budget: if the device still does not answer, the link is down and the
/// caller leaves everything staged.
pub fn ensure_transceiver<L: LinkControl>(
    link: &L,
    telemetry: &TelemetryConfig,
    channel: u8,
) -> Result<()> {
    if link.probe(&telemetry.transceiver_ip) == 0 {
        return Ok(());
    }

    info!(ip = %telemetry.transceiver_ip, channel, "transceiver silent, powering on");
    let code = link.power_on(channel);
    if code != 0 {
        return Err(TelemetryError::PowerOnFailed(code));
    }

    if link.probe(&telemetry.transceiver_ip) != 0 {
        return Err(TelemetryError::TransceiverUnreachable(
            telemetry.transceiver_ip.clone(),
        ));
    }
    Ok(())
}

/// The rsync destination mirroring a staged file onto the hub.
///
/// `<stream>/transmit/<name>` on the node lands in `<stream>/receive/` on
/// the hub, where the hub's own monitor picks it up.
pub fn lan_destination(file: &Path, user: &str, target_ip: &str) -> Result<String> {
    let name = file
        .file_name()
        .ok_or_else(|| TelemetryError::InvalidPath(file.display().to_string()))?;
    let stream_root = file
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| TelemetryError::InvalidPath(file.display().to_string()))?;
    let remote = stream_root.join("receive").join(name);
    Ok(format!("{user}@{target_ip}:{}", remote.display()))
}

/// Hub probing and file transfer, split out so the delete-on-success and
/// retain-on-failure cleanup branches can be tested without a network.
pub trait Transport {
    /// Probe the far end, returning the ping exit status (0 = reachable).
    fn probe(&self, ip: &str) -> i32;

    /// Transfer one file, returning the transfer command's exit status.
    fn send(&self, file: &Path, telemetry: &TelemetryConfig, mode: TransportMode) -> Result<i32>;
}

/// The production [`Transport`]: ping plus rsync (LAN) or curl (long-haul).
pub struct CommandTransport;

impl Transport for CommandTransport {
    fn probe(&self, ip: &str) -> i32 {
        vigil_exec::ping(ip, 3)
    }

    fn send(&self, file: &Path, telemetry: &TelemetryConfig, mode: TransportMode) -> Result<i32> {
        match mode {
            TransportMode::Lan => send_lan(file, telemetry),
            TransportMode::LongHaul => send_long_haul(file, telemetry),
        }
    }
}

fn send_lan(file: &Path, telemetry: &TelemetryConfig) -> Result<i32> {
    let user = telemetry.lan_user()?;
    let destination = lan_destination(file, user, &telemetry.target_ip)?;
    // rsync removes the source itself on success; one attempt, the outer
    // pass is the retry loop.
    Ok(vigil_exec::rsync(file, destination, true, 1))
}

fn send_long_haul(file: &Path, telemetry: &TelemetryConfig) -> Result<i32> {
    let port = telemetry.target_port()?;
    let token = telemetry.token()?;
    let url = format!("http://{}:{port}/upload?token={token}", telemetry.target_ip);

    let mut command = Command::new("curl");
    command
        .args(["-s", "-S", "--fail", "-F"])
        .arg(format!("file=@{}", file.display()))
        .arg(&url)
        .stdout(Stdio::null());
    Ok(vigil_exec::run_with_retry(
        &mut command,
        vigil_exec::DEFAULT_MAX_ATTEMPTS,
    ))
}

/// Transfer one staged file over `transport`, assuming the transceiver is
/// already up.
///
/// On success the local copy is gone, either removed by the transfer tool or
/// deleted here afterwards. On any failure the file stays staged, untouched.
pub fn deliver_file_with<T: Transport>(
    transport: &T,
    file: &Path,
    telemetry: &TelemetryConfig,
    mode: TransportMode,
) -> Result<()> {
    if transport.probe(&telemetry.target_ip) != 0 {
        return Err(TelemetryError::HubUnreachable(telemetry.target_ip.clone()));
    }

    let code = transport.send(file, telemetry, mode)?;
    if code != 0 {
        warn!(file = %file.display(), code, mode = mode.as_str(), "transfer failed");
        return Err(TelemetryError::TransferFailed(code));
    }

    if file.exists() {
        fs::remove_file(file)?;
    }
    info!(file = %file.display(), mode = mode.as_str(), "delivered");
    Ok(())
}

/// [`deliver_file_with`] over the production subprocess transport.
pub fn deliver_file(file: &Path, telemetry: &TelemetryConfig, mode: TransportMode) -> Result<()> {
    deliver_file_with(&CommandTransport, file, telemetry, mode)
}

/// Full delivery of one file: bring up the link, then transfer.
pub fn deliver(
    file: &Path,
    telemetry: &TelemetryConfig,
    relay: &RelayConfig,
    mode: TransportMode,
) -> Result<()> {
    let link = RelayLink { relay };
    ensure_transceiver(&link, telemetry, relay.channel_for(mode))?;
    deliver_file(file, telemetry, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    struct ScriptedLink {
        // Exit codes returned by successive probe calls.
        probe_codes: RefCell<Vec<i32>>,
        power_on_code: i32,
        power_on_calls: RefCell<u32>,
    }

    impl ScriptedLink {
        fn new(probe_codes: Vec<i32>, power_on_code: i32) -> Self {
            ScriptedLink {
                probe_codes: RefCell::new(probe_codes),
                power_on_code,
                power_on_calls: RefCell::new(0),
            }
        }
    }

    impl LinkControl for ScriptedLink {
        fn probe(&self, _ip: &str) -> i32 {
            let mut codes = self.probe_codes.borrow_mut();
            if codes.is_empty() {
                1
            } else {
                codes.remove(0)
            }
        }

        fn power_on(&self, _channel: u8) -> i32 {
            *self.power_on_calls.borrow_mut() += 1;
            self.power_on_code
        }
    }

    fn telemetry() -> TelemetryConfig {
        TelemetryConfig {
            mode: TransportMode::Lan,
            transceiver_ip: "192.168.0.30".into(),
            target_ip: "192.168.1.2".into(),
            target_port: None,
            token: None,
            lan_user: Some("vigil".into()),
        }
    }

    #[test]
    fn responsive_transceiver_is_not_power_cycled() {
        let link = ScriptedLink::new(vec![0], 0);
        ensure_transceiver(&link, &telemetry(), 1).unwrap();
        assert_eq!(*link.power_on_calls.borrow(), 0);
    }

    #[test]
    fn silent_transceiver_is_powered_on_exactly_once() {
        let link = ScriptedLink::new(vec![1, 0], 0);
        ensure_transceiver(&link, &telemetry(), 1).unwrap();
        assert_eq!(*link.power_on_calls.borrow(), 1);
    }

    #[test]
    fn transceiver_still_silent_after_power_on_is_an_error() {
        let link = ScriptedLink::new(vec![1, 1], 0);
        let err = ensure_transceiver(&link, &telemetry(), 1).unwrap_err();
        assert!(matches!(err, TelemetryError::TransceiverUnreachable(_)));
        assert_eq!(*link.power_on_calls.borrow(), 1);
    }

    #[test]
    fn failed_power_on_surfaces_the_relay_exit_status() {
        let link = ScriptedLink::new(vec![1], 7);
        let err = ensure_transceiver(&link, &telemetry(), 1).unwrap_err();
        assert!(matches!(err, TelemetryError::PowerOnFailed(7)));
    }

    struct ScriptedTransport {
        probe_code: i32,
        send_code: i32,
        // Mirror rsync --remove-source-files: the tool deletes the source.
        removes_source: bool,
        send_calls: RefCell<u32>,
    }

    impl ScriptedTransport {
        fn new(probe_code: i32, send_code: i32) -> Self {
            ScriptedTransport {
                probe_code,
                send_code,
                removes_source: false,
                send_calls: RefCell::new(0),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn probe(&self, _ip: &str) -> i32 {
            self.probe_code
        }

        fn send(&self, file: &Path, _telemetry: &TelemetryConfig, _mode: TransportMode) -> Result<i32> {
            *self.send_calls.borrow_mut() += 1;
            if self.removes_source && self.send_code == 0 {
                fs::remove_file(file)?;
            }
            Ok(self.send_code)
        }
    }

    fn staged_file(dir: &Path) -> std::path::PathBuf {
        let transmit = dir.join("gnss-a/transmit");
        fs::create_dir_all(&transmit).unwrap();
        let file = transmit.join("0A10N6E9.sbf");
        fs::write(&file, b"sbf-bytes").unwrap();
        file
    }

    #[test]
    fn successful_delivery_removes_the_staged_copy() {
        let dir = tempfile::tempdir().unwrap();
        let file = staged_file(dir.path());

        let transport = ScriptedTransport::new(0, 0);
        deliver_file_with(&transport, &file, &telemetry(), TransportMode::LongHaul).unwrap();

        assert!(!file.exists(), "staged copy should be gone after delivery");
    }

    #[test]
    fn delivery_tolerates_the_transfer_tool_removing_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = staged_file(dir.path());

        let mut transport = ScriptedTransport::new(0, 0);
        transport.removes_source = true;
        deliver_file_with(&transport, &file, &telemetry(), TransportMode::Lan).unwrap();

        assert!(!file.exists());
    }

    #[test]
    fn failed_transfer_retains_the_staged_copy_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = staged_file(dir.path());

        let transport = ScriptedTransport::new(0, 23);
        let err = deliver_file_with(&transport, &file, &telemetry(), TransportMode::Lan)
            .unwrap_err();

        assert!(matches!(err, TelemetryError::TransferFailed(23)));
        assert_eq!(fs::read(&file).unwrap(), b"sbf-bytes");
    }

    #[test]
    fn unreachable_hub_fails_before_any_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let file = staged_file(dir.path());

        let transport = ScriptedTransport::new(1, 0);
        let err = deliver_file_with(&transport, &file, &telemetry(), TransportMode::Lan)
            .unwrap_err();

        assert!(matches!(err, TelemetryError::HubUnreachable(_)));
        assert_eq!(*transport.send_calls.borrow(), 0);
        assert!(file.exists());
    }

    #[test]
    fn lan_destination_mirrors_transmit_into_receive() {
        let file = PathBuf::from("/data/gnss-a/transmit/0A10N6E9.sbf");
        let destination = lan_destination(&file, "vigil", "192.168.1.2").unwrap();
        assert_eq!(destination, "vigil@192.168.1.2:/data/gnss-a/receive/0A10N6E9.sbf");
    }

    #[test]
    fn lan_transfer_without_a_user_is_a_config_error() {
        let mut cfg = telemetry();
        cfg.lan_user = None;
        let err = send_lan(Path::new("/data/s/transmit/f"), &cfg).unwrap_err();
        assert!(matches!(err, TelemetryError::Config(_)));
    }
}
