// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Device-tree style description of platform devices.
//!
//! Only the parts drivers consume are modelled: a node name, the list of
//! compatible strings, and named properties with raw byte values. Numeric
//! properties are stored as big-endian 32-bit cells, as in a flattened device
//! tree.

use crate::ErrorCode;

/// A device-tree node describing one device.
pub trait DeviceNode {
    fn name(&self) -> &str;

    /// Whether `compatible` is one of the node's compatible strings.
    fn is_compatible(&self, compatible: &str) -> bool;

    /// Raw value of property `name`, if present.
    fn property(&self, name: &str) -> Option<&[u8]>;

    /// Whether property `name` is present. Boolean properties are encoded as
    /// present-and-empty.
    fn property_present(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Read property `name` as a single 32-bit cell.
    ///
    /// Returns `NODEVICE` if the property is absent and `INVAL` if its value
    /// is not exactly one cell.
    fn property_read_u32(&self, name: &str) -> Result<u32, ErrorCode> {
        let value = self.property(name).ok_or(ErrorCode::NODEVICE)?;
        let cell: [u8; 4] = value.try_into().map_err(|_| ErrorCode::INVAL)?;
        Ok(u32::from_be_bytes(cell))
    }
}

#[derive(Clone, Copy, Debug)]
enum PropertyValue<'a> {
    Empty,
    Cell([u8; 4]),
    Bytes(&'a [u8]),
}

/// A named property of a [`StaticDeviceNode`].
#[derive(Clone, Copy, Debug)]
pub struct Property<'a> {
    name: &'a str,
    value: PropertyValue<'a>,
}

impl<'a> Property<'a> {
    /// A boolean property.
    pub const fn flag(name: &'a str) -> Property<'a> {
        Property {
            name,
            value: PropertyValue::Empty,
        }
    }

    /// A property holding one 32-bit cell.
    pub const fn u32(name: &'a str, value: u32) -> Property<'a> {
        Property {
            name,
            value: PropertyValue::Cell(value.to_be_bytes()),
        }
    }

    /// A property holding arbitrary bytes.
    pub const fn bytes(name: &'a str, value: &'a [u8]) -> Property<'a> {
        Property {
            name,
            value: PropertyValue::Bytes(value),
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn value(&self) -> &[u8] {
        match &self.value {
            PropertyValue::Empty => &[],
            PropertyValue::Cell(cell) => &cell[..],
            PropertyValue::Bytes(bytes) => *bytes,
        }
    }
}

/// A device node described by static tables, as boards declare them.
pub struct StaticDeviceNode<'a> {
    name: &'a str,
    compatible: &'a [&'a str],
    properties: &'a [Property<'a>],
}

impl<'a> StaticDeviceNode<'a> {
    pub const fn new(
        name: &'a str,
        compatible: &'a [&'a str],
        properties: &'a [Property<'a>],
    ) -> StaticDeviceNode<'a> {
        StaticDeviceNode {
            name,
            compatible,
            properties,
        }
    }
}

impl DeviceNode for StaticDeviceNode<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn is_compatible(&self, compatible: &str) -> bool {
        self.compatible.iter().any(|c| *c == compatible)
    }

    fn property(&self, name: &str) -> Option<&[u8]> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value())
    }
}

/// One entry of a driver's device-tree match table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfDeviceId {
    pub compatible: &'static str,
}

/// The first entry of `table` that `node` is compatible with.
pub fn of_match_device<'t, N: DeviceNode + ?Sized>(
    table: &'t [OfDeviceId],
    node: &N,
) -> Option<&'t OfDeviceId> {
    table.iter().find(|id| node.is_compatible(id.compatible))
}
