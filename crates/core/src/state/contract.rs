//! Deployed contract metadata.

use crate::crypto::hash160;
use crate::error::Result;
use crate::io::{BinaryReader, BinaryWriter, Serializable};
use crate::transaction::ContractProperties;
use crate::uint160::UInt160;

/// A contract published to the chain, keyed by its script hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractState {
    pub script: Vec<u8>,
    pub parameter_list: Vec<u8>,
    pub return_type: u8,
    pub properties: ContractProperties,
    pub name: String,
    pub code_version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

impl ContractState {
    pub fn script_hash(&self) -> UInt160 {
        hash160(&self.script)
    }

    pub fn has_storage(&self) -> bool {
        self.properties.contains(ContractProperties::HAS_STORAGE)
    }

    pub fn is_payable(&self) -> bool {
        self.properties.contains(ContractProperties::PAYABLE)
    }
}

impl Serializable for ContractState {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(0);
        writer.write_var_bytes(&self.script);
        writer.write_var_bytes(&self.parameter_list);
        writer.write_u8(self.return_type);
        writer.write_u8(self.properties.bits());
        writer.write_var_string(&self.name);
        writer.write_var_string(&self.code_version);
        writer.write_var_string(&self.author);
        writer.write_var_string(&self.email);
        writer.write_var_string(&self.description);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let _version = reader.read_u8()?;
        Ok(Self {
            script: reader.read_var_bytes(0x10000)?,
            parameter_list: reader.read_var_bytes(0xFF)?,
            return_type: reader.read_u8()?,
            properties: ContractProperties::from_bits_truncate(reader.read_u8()?),
            name: reader.read_var_string(1024)?,
            code_version: reader.read_var_string(1024)?,
            author: reader.read_var_string(1024)?,
            email: reader.read_var_string(1024)?,
            description: reader.read_var_string(0xFFFF)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_flags() {
        let contract = ContractState {
            script: vec![0x51, 0x52],
            parameter_list: vec![0x00],
            return_type: 0x05,
            properties: ContractProperties::HAS_STORAGE | ContractProperties::PAYABLE,
            name: "Vault".into(),
            code_version: "1.0".into(),
            author: "dev".into(),
            email: "dev@example.org".into(),
            description: String::new(),
        };
        let decoded = ContractState::from_bytes(&contract.to_bytes()).unwrap();
        assert_eq!(decoded, contract);
        assert!(decoded.has_storage());
        assert!(decoded.is_payable());
        assert_eq!(decoded.script_hash(), hash160(&contract.script));
    }
}
