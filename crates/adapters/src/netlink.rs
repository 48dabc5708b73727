// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EventSource`: kernel uevents over `NETLINK_KOBJECT_UEVENT`. Out of
//! scope beyond the single blocking `recv` call - this adapter owns the
//! socket and the wire parsing, nothing else.
//!
//! `nix::sys::socket` wraps `socket(2)`/`bind(2)`/`recv(2)` without any
//! local `unsafe` block, so this satisfies `forbid(unsafe_code)` without
//! the ioctl-style substitution `partition.rs` needed.

use devmand_core::{Action, DevNum, Device};
use devmand_scheduler::ports::EventSource;
use nix::sys::socket::{
    bind, recv, socket, AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType,
};
use std::collections::BTreeMap;
use std::io;
use std::os::fd::OwnedFd;

/// The kernel-side multicast group carrying `udev` uevents (as opposed to
/// group 1, `UDEV_MONITOR_KERNEL`, reserved for the kernel's own internal
/// use before udev re-broadcasts on group 2 - we listen on the kernel
/// group directly, same as udevd itself does before re-publishing).
const UEVENT_GROUP: u32 = 1;

pub struct NetlinkEventSource {
    socket: OwnedFd,
}

impl NetlinkEventSource {
    pub fn bind() -> io::Result<Self> {
        let socket = socket(
            AddressFamily::Netlink,
            SockType::Raw,
            SockFlag::empty(),
            SockProtocol::NetlinkKObjectUEvent,
        )
        .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        let addr = NetlinkAddr::new(0, UEVENT_GROUP);
        bind(std::os::fd::AsRawFd::as_raw_fd(&socket), &addr)
            .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        Ok(Self { socket })
    }
}

impl EventSource for NetlinkEventSource {
    fn recv(&self) -> Result<Device, io::Error> {
        let mut buf = [0u8; 8192];
        let n = recv(std::os::fd::AsRawFd::as_raw_fd(&self.socket), &mut buf, MsgFlags::empty())
            .map_err(|e| io::Error::from_raw_os_error(e as i32))?;
        parse_uevent(&buf[..n])
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed uevent record"))
    }
}

/// Parses a single `NETLINK_KOBJECT_UEVENT` datagram: a header line
/// (`"add@/devices/..."`, ignored - the structured `ACTION=`/`DEVPATH=`
/// fields below repeat the same information) followed by NUL-separated
/// `KEY=value` pairs.
fn parse_uevent(raw: &[u8]) -> Option<Device> {
    let nul = raw.iter().position(|&b| b == 0)?;
    let mut fields: BTreeMap<&str, &str> = BTreeMap::new();
    for field in raw[nul + 1..].split(|&b| b == 0) {
        if field.is_empty() {
            continue;
        }
        let line = std::str::from_utf8(field).ok()?;
        if let Some((key, value)) = line.split_once('=') {
            fields.insert(key, value);
        }
    }

    let action = match *fields.get("ACTION")? {
        "add" => Action::Add,
        "remove" => Action::Remove,
        "change" => Action::Change,
        "move" => Action::Move,
        "online" => Action::Online,
        "offline" => Action::Offline,
        "bind" => Action::Bind,
        "unbind" => Action::Unbind,
        _ => return None,
    };
    let seqnum = fields.get("SEQNUM")?.parse().ok()?;
    let devpath = (*fields.get("DEVPATH")?).to_string();
    let subsystem = (*fields.get("SUBSYSTEM")?).to_string();
    let devname = fields.get("DEVNAME").map(|s| format!("/dev/{s}"));
    let devnum = match (fields.get("MAJOR"), fields.get("MINOR")) {
        (Some(major), Some(minor)) => Some(DevNum::new(major.parse().ok()?, minor.parse().ok()?)),
        _ => None,
    };
    let ifindex = fields.get("IFINDEX").and_then(|s| s.parse().ok());
    let devpath_old = fields.get("DEVPATH_OLD").map(|s| s.to_string());

    Some(Device {
        seqnum,
        devpath,
        subsystem,
        devname,
        devnum,
        ifindex,
        devpath_old,
        action,
        properties: BTreeMap::new(),
    })
}
