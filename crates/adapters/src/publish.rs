// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EventSink`: republishes a processed device to the multicast group
//! userspace subscribers listen on. Opaque beyond the single send call;
//! this adapter only needs to serialize a `Device` back onto the wire
//! format subscribers already expect from the kernel's own uevent socket.
//!
//! Group 2 (as opposed to group 1, the kernel's own broadcast group that
//! `netlink::NetlinkEventSource` listens on) is the conventional
//! userspace-republish group - the same split real udev monitors use
//! between `UDEV_MONITOR_KERNEL` and `UDEV_MONITOR_UDEV`.

use devmand_core::Device;
use devmand_scheduler::ports::EventSink;
use nix::sys::socket::{sendto, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

const PUBLISH_GROUP: u32 = 2;

pub struct NetlinkEventSink {
    socket: OwnedFd,
}

impl NetlinkEventSink {
    pub fn bind() -> io::Result<Self> {
        let socket = socket(
            AddressFamily::Netlink,
            SockType::Raw,
            SockFlag::empty(),
            SockProtocol::NetlinkKObjectUEvent,
        )
        .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        Ok(Self { socket })
    }

    fn encode(device: &Device) -> Vec<u8> {
        let mut buf = format!("{}@{}", device.action, device.devpath).into_bytes();
        buf.push(0);
        let mut push = |key: &str, value: &str| {
            buf.extend_from_slice(key.as_bytes());
            buf.push(b'=');
            buf.extend_from_slice(value.as_bytes());
            buf.push(0);
        };
        push("ACTION", &device.action.to_string());
        push("SEQNUM", &device.seqnum.to_string());
        push("DEVPATH", &device.devpath);
        push("SUBSYSTEM", &device.subsystem);
        if let Some(devname) = device.devname.as_deref().and_then(|p| p.strip_prefix("/dev/")) {
            push("DEVNAME", devname);
        }
        if let Some(devnum) = device.devnum {
            push("MAJOR", &devnum.major.to_string());
            push("MINOR", &devnum.minor.to_string());
        }
        if let Some(ifindex) = device.ifindex {
            push("IFINDEX", &ifindex.to_string());
        }
        if let Some(old) = device.devpath_old.as_deref() {
            push("DEVPATH_OLD", old);
        }
        for (key, value) in &device.properties {
            push(key, value);
        }
        buf
    }
}

impl EventSink for NetlinkEventSink {
    fn send(&self, device: &Device) -> Result<(), io::Error> {
        let payload = Self::encode(device);
        let addr = NetlinkAddr::new(0, PUBLISH_GROUP);
        sendto(self.socket.as_raw_fd(), &payload, &addr, MsgFlags::empty())
            .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        Ok(())
    }
}
