//! Register bookkeeping shared by the parser and the code generator.

use std::collections::BTreeMap;

use crate::swizzle::WriteMask;
use crate::types::{RegisterType, Usage};

/// One tracked `(type, number)` register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Register {
    pub reg_type: RegisterType,
    pub reg_num: u32,
    pub usage: Usage,
    /// Usage index for attributes, texture type for samplers.
    pub index: u32,
    pub write_mask: WriteMask,
    /// Attribute result-mod flags, sampler TEXBEM marker, or label call context
    /// (1 called inside a loop, -1 outside, 0 never called).
    pub misc: i32,
    pub written: bool,
    /// Constant array (index into the context's variables) this register resolved into.
    pub array: Option<usize>,
}

impl Register {
    fn new(reg_type: RegisterType, reg_num: u32) -> Self {
        Self {
            reg_type,
            reg_num,
            usage: Usage::Unknown,
            index: 0,
            write_mask: WriteMask(0),
            misc: 0,
            written: false,
            array: None,
        }
    }
}

fn register_key(reg_type: RegisterType, reg_num: u32) -> u32 {
    (reg_type.raw() << 16) | reg_num
}

/// Registers ordered by type, then number.
#[derive(Debug, Clone, Default)]
pub(crate) struct RegisterList {
    items: BTreeMap<u32, Register>,
}

impl RegisterList {
    pub fn find(&self, reg_type: RegisterType, reg_num: u32) -> Option<&Register> {
        self.items.get(&register_key(reg_type, reg_num))
    }

    pub fn find_mut(&mut self, reg_type: RegisterType, reg_num: u32) -> Option<&mut Register> {
        self.items.get_mut(&register_key(reg_type, reg_num))
    }

    pub fn contains(&self, reg_type: RegisterType, reg_num: u32) -> bool {
        self.items.contains_key(&register_key(reg_type, reg_num))
    }

    /// Returns the existing entry or inserts a fresh one.
    pub fn insert(&mut self, reg_type: RegisterType, reg_num: u32) -> &mut Register {
        self.items
            .entry(register_key(reg_type, reg_num))
            .or_insert_with(|| Register::new(reg_type, reg_num))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.items.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_and_sorted() {
        let mut list = RegisterList::default();
        list.insert(RegisterType::Temp, 3).written = true;
        list.insert(RegisterType::Input, 0);
        list.insert(RegisterType::Temp, 1);
        let again = list.insert(RegisterType::Temp, 3);
        assert!(again.written);

        let order: Vec<_> = list.iter().map(|r| (r.reg_type, r.reg_num)).collect();
        assert_eq!(
            order,
            vec![
                (RegisterType::Temp, 1),
                (RegisterType::Temp, 3),
                (RegisterType::Input, 0),
            ]
        );
        assert!(list.contains(RegisterType::Input, 0));
        assert!(list.find(RegisterType::Input, 1).is_none());
    }
}
