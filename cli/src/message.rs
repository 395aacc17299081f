//! Offline P-Chain message codec. Nothing here touches the network.

use clap::Parser;
use ethers::{types::Bytes, utils::hex};
use valman_contracts::{
    ids::ConversionId,
    messages::{
        conversion_id, initial_validation_id, pack_conversion_data,
        pack_l1_validator_registration_message, pack_l1_validator_weight_message,
        pack_register_l1_validator_message, pack_subnet_to_l1_conversion_message,
        pack_validation_uptime_message, unpack_conversion_data, verify_conversion,
        ConversionData, PChainMessage, ValidationPeriod,
    },
    SubnetId, ValidationId,
};

use crate::{error::Error, read_json_arg};

#[derive(Parser, Debug, Clone)]
pub enum MessageCommands {
    #[command(name = "pack-conversion-data", about = "Pack conversion data given as JSON")]
    PackConversionData { data: String },
    #[command(name = "pack-conversion", about = "Pack a SubnetToL1ConversionMessage")]
    PackConversion { conversion_id: ConversionId },
    #[command(name = "pack-register", about = "Pack a RegisterL1ValidatorMessage from JSON")]
    PackRegister {
        /// Validation period as JSON, inline or a file path
        period: String,
    },
    #[command(name = "pack-registration", about = "Pack an L1ValidatorRegistrationMessage")]
    PackRegistration {
        validation_id: ValidationId,
        /// The registration expired or the validator was removed
        #[arg(long)]
        not_registered: bool,
    },
    #[command(name = "pack-weight", about = "Pack an L1ValidatorWeightMessage")]
    PackWeight {
        validation_id: ValidationId,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        weight: u64,
    },
    #[command(name = "pack-uptime", about = "Pack a ValidationUptimeMessage")]
    PackUptime {
        validation_id: ValidationId,
        /// Uptime in seconds
        #[arg(long)]
        uptime: u64,
    },
    #[command(name = "unpack", about = "Decode any P-Chain message from hex")]
    Unpack {
        message: Bytes,
        /// Decode packed conversion data instead of a message
        #[arg(long)]
        conversion_data: bool,
    },
    #[command(name = "conversion-id", about = "Conversion id of conversion data given as JSON")]
    ConversionId { data: String },
    #[command(name = "verify-conversion", about = "Check a conversion message against its data")]
    VerifyConversion { message: Bytes, data: String },
    #[command(name = "initial-validation-id", about = "Validation id of an initial validator")]
    InitialValidationId { subnet_id: SubnetId, index: u32 },
}

pub fn parse_message_subcommands(subcmd: MessageCommands) -> Result<(), Error> {
    println!("{}", render(subcmd)?);
    Ok(())
}

fn encode(message: &[u8]) -> String {
    format!("0x{}", hex::encode(message))
}

/// Runs a codec command and returns what it prints.
pub fn render(subcmd: MessageCommands) -> Result<String, Error> {
    Ok(match subcmd {
        MessageCommands::PackConversionData { data } => {
            let data: ConversionData = read_json_arg(&data)?;
            encode(&pack_conversion_data(&data)?)
        }
        MessageCommands::PackConversion { conversion_id } => {
            encode(&pack_subnet_to_l1_conversion_message(conversion_id))
        }
        MessageCommands::PackRegister { period } => {
            let period: ValidationPeriod = read_json_arg(&period)?;
            let (validation_id, message) = pack_register_l1_validator_message(&period)?;
            format!("validation id: {validation_id}\nmessage: {}", encode(&message))
        }
        MessageCommands::PackRegistration { validation_id, not_registered } => {
            encode(&pack_l1_validator_registration_message(validation_id, !not_registered))
        }
        MessageCommands::PackWeight { validation_id, nonce, weight } => {
            encode(&pack_l1_validator_weight_message(validation_id, nonce, weight))
        }
        MessageCommands::PackUptime { validation_id, uptime } => {
            encode(&pack_validation_uptime_message(validation_id, uptime))
        }
        MessageCommands::Unpack { message, conversion_data: true } => {
            serde_json::to_string_pretty(&unpack_conversion_data(&message)?)?
        }
        MessageCommands::Unpack { message, conversion_data: false } => {
            serde_json::to_string_pretty(&PChainMessage::decode(&message)?)?
        }
        MessageCommands::ConversionId { data } => {
            let data: ConversionData = read_json_arg(&data)?;
            conversion_id(&data)?.to_string()
        }
        MessageCommands::VerifyConversion { message, data } => {
            let data: ConversionData = read_json_arg(&data)?;
            format!("conversion id {} matches", verify_conversion(&message, &data)?)
        }
        MessageCommands::InitialValidationId { subnet_id, index } => {
            initial_validation_id(subnet_id, index).to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use valman_contracts::messages::MessageError;

    use super::*;

    const CONVERSION_DATA: &str = r#"{
        "subnetId": "0x0101010101010101010101010101010101010101010101010101010101010101",
        "validatorManagerBlockchainId": "0x0202020202020202020202020202020202020202020202020202020202020202",
        "validatorManagerAddress": "0x0303030303030303030303030303030303030303",
        "initialValidators": [{
            "nodeId": "0x0404040404040404040404040404040404040404",
            "blsPublicKey": "0x050505050505050505050505050505050505050505050505050505050505050505050505050505050505050505050505",
            "weight": 100
        }]
    }"#;

    const CONVERSION_ID: &str =
        "0x700aae0b4b353287b8a1345628ef28b4424d1c0bbee1c58bf2c4c81a76bd4566";

    #[test]
    fn test_conversion_id_from_inline_json() {
        let id = render(MessageCommands::ConversionId { data: CONVERSION_DATA.to_owned() });
        assert_eq!(id.unwrap(), CONVERSION_ID);
    }

    #[test]
    fn test_conversion_id_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversion.json");
        std::fs::write(&path, CONVERSION_DATA).unwrap();
        let data = path.display().to_string();
        assert_eq!(render(MessageCommands::ConversionId { data }).unwrap(), CONVERSION_ID);
    }

    #[test]
    fn test_verify_conversion() {
        let conversion_id: ConversionId = CONVERSION_ID.parse().unwrap();
        let message = Bytes::from(pack_subnet_to_l1_conversion_message(conversion_id));
        let data = CONVERSION_DATA.to_owned();
        assert!(render(MessageCommands::VerifyConversion { message, data }).is_ok());

        let message = Bytes::from(pack_subnet_to_l1_conversion_message(ConversionId([9; 32])));
        let data = CONVERSION_DATA.to_owned();
        assert!(matches!(
            render(MessageCommands::VerifyConversion { message, data }),
            Err(Error::MessageError(MessageError::InvalidConversionId { .. }))
        ));
    }

    #[test]
    fn test_unpack_weight_message() {
        let packed = render(MessageCommands::PackWeight {
            validation_id: ValidationId([5; 32]),
            nonce: 2,
            weight: 40,
        })
        .unwrap();
        let message: Bytes = packed.parse().unwrap();
        assert_eq!(message.len(), 54);

        let unpacked = render(MessageCommands::Unpack { message, conversion_data: false }).unwrap();
        let json: serde_json::Value = serde_json::from_str(&unpacked).unwrap();
        assert_eq!(json["type"], "l1ValidatorWeight");
        assert_eq!(json["nonce"], 2);
        assert_eq!(json["weight"], 40);
    }

    #[test]
    fn test_unpack_rejects_truncated_message() {
        let message = Bytes::from(vec![0, 0, 0, 0]);
        assert!(matches!(
            render(MessageCommands::Unpack { message, conversion_data: false }),
            Err(Error::MessageError(MessageError::InvalidMessageLength { .. }))
        ));
    }

    #[test]
    fn test_initial_validation_id() {
        let subnet_id = SubnetId([1; 32]);
        assert_eq!(
            render(MessageCommands::InitialValidationId { subnet_id, index: 0 }).unwrap(),
            "0x3f6c2724a21a3b29ef886a52aa414bec96c46f7af137c636065209ff892cee6c"
        );
    }
}
