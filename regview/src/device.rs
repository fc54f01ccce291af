//! Boundary to the target device
//!
//! The model never waits for the device. It sends requests and carries on; values arrive later
//! as [`DeviceReport`]s that the owner of the model feeds back in, see
//! [`crate::RegisterModel::apply_reports`].

use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, warn};

/// Outbound side of the device protocol
pub trait DeviceLink {
    /// Ask for fresh values of `addresses`
    fn request_current_values(&mut self, addresses: &[u64]);
    /// Ask for `value` to be written at `address`
    fn write_value(&mut self, address: u64, value: u64);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceRequest {
    Read(Vec<u64>),
    Write { address: u64, value: u64 },
}

/// Value read from the target at an absolute address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceReport {
    pub address: u64,
    pub value: u64,
}

/// Channel for reports coming from the device, to be drained by the model's owner
pub fn report_channel() -> (Sender<DeviceReport>, Receiver<DeviceReport>) {
    mpsc::channel()
}

/// [`DeviceLink`] forwarding every request over a channel
pub struct ChannelDevice {
    requests: Sender<DeviceRequest>,
}

impl ChannelDevice {
    /// Returns the link and the receiving end the device side reads requests from
    pub fn new() -> (Self, Receiver<DeviceRequest>) {
        let (tx, rx) = mpsc::channel();
        (Self { requests: tx }, rx)
    }

    fn send(&self, request: DeviceRequest) {
        if let Err(e) = self.requests.send(request) {
            warn!("device is no longer listening, dropped {:?}", e.0);
        }
    }
}

impl DeviceLink for ChannelDevice {
    fn request_current_values(&mut self, addresses: &[u64]) {
        self.send(DeviceRequest::Read(addresses.to_vec()));
    }

    fn write_value(&mut self, address: u64, value: u64) {
        self.send(DeviceRequest::Write { address, value });
    }
}

/// [`DeviceLink`] for browsing a description without a target
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl DeviceLink for Detached {
    fn request_current_values(&mut self, addresses: &[u64]) {
        debug!("no device attached, not reading {} registers", addresses.len());
    }

    fn write_value(&mut self, address: u64, value: u64) {
        debug!("no device attached, not writing {value:#x} to {address:#x}");
    }
}

#[test]
fn channel_device_forwards_requests() {
    let (mut device, requests) = ChannelDevice::new();
    device.request_current_values(&[0x10, 0x14]);
    device.write_value(0x10, 3);

    assert_eq!(
        requests.try_iter().collect::<Vec<_>>(),
        [
            DeviceRequest::Read(vec![0x10, 0x14]),
            DeviceRequest::Write {
                address: 0x10,
                value: 3
            }
        ]
    );

    // A device that went away must not take the model down with it
    drop(requests);
    device.write_value(0x10, 4);
}
