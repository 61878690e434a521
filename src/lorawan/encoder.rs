//! LoRaWAN PHY payload builder for uplink traffic
//!
//! Frame structure (data up):
//!   MHDR(1) | DevAddr(4,LE) | FCtrl(1) | FCnt(2,LE) | [FPort(1) | FRMPayload(N)] | MIC(4,LE)
//!
//! Join request:
//!   MHDR(1) | AppEUI(8,LE) | DevEUI(8,LE) | DevNonce(2,LE) | MIC(4,LE)
//!
//! The MIC is left as 0x00000000: the payload is not encrypted and no
//! NwkSKey/AppKey CMAC is computed here.

use super::MType;
use crate::identity::SessionIdentity;

/// Parameters for building a LoRaWAN data frame
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    /// Message type (UnconfirmedDataUp for periodic sensor data)
    pub mtype: MType,
    /// Device address (32-bit)
    pub dev_addr: u32,
    /// Frame counter (16-bit, managed by caller)
    pub fcnt: u16,
    /// FPort (application port, 1-223 for application data)
    pub f_port: u8,
    /// Application payload
    pub payload: Vec<u8>,
}

impl FrameBuilder {
    /// Create a new frame builder for an unconfirmed uplink
    pub fn new_uplink(dev_addr: u32, fcnt: u16, f_port: u8, payload: Vec<u8>) -> Self {
        Self {
            mtype: MType::UnconfirmedDataUp,
            dev_addr,
            fcnt,
            f_port,
            payload,
        }
    }

    /// Build the raw LoRaWAN PHY payload bytes
    pub fn build(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(13 + self.payload.len());

        frame.push(self.mtype.mhdr());
        frame.extend_from_slice(&self.dev_addr.to_le_bytes());

        // FCtrl: ADR=0, ADRACKReq=0, ACK=0, ClassB=0, FOptsLen=0
        frame.push(0x00);

        frame.extend_from_slice(&self.fcnt.to_le_bytes());

        // FPort only if payload is present
        if !self.payload.is_empty() {
            frame.push(self.f_port);
            frame.extend_from_slice(&self.payload);
        }

        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        frame
    }
}

/// Build a 23-byte JoinRequest PHY payload.
///
/// EUIs are held MSB first (as printed); on air they are little-endian.
pub fn join_request(identity: &SessionIdentity) -> Vec<u8> {
    let mut frame = Vec::with_capacity(23);
    frame.push(MType::JoinRequest.mhdr());
    frame.extend(identity.network_id.iter().rev());
    frame.extend(identity.device_id.iter().rev());
    frame.extend_from_slice(&identity.dev_nonce().to_le_bytes());
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ProviderProfile;

    #[test]
    fn test_build_unconfirmed_uplink() {
        let builder = FrameBuilder::new_uplink(
            0x0C108801,
            42,
            1,
            vec![0x01, 0x67, 0x00, 0xD7, 0x02, 0x68, 0x82],
        );

        let frame = builder.build();

        // MHDR(1) + DevAddr(4) + FCtrl(1) + FCnt(2) + FPort(1) + Payload(7) + MIC(4) = 20
        assert_eq!(frame.len(), 20);
        assert_eq!(frame[0], 0x40);
        assert_eq!(&frame[1..5], &[0x01, 0x88, 0x10, 0x0C]);
        assert_eq!(frame[5], 0x00);
        assert_eq!(&frame[6..8], &42u16.to_le_bytes());
        assert_eq!(frame[8], 1);
        assert_eq!(&frame[9..16], &[0x01, 0x67, 0x00, 0xD7, 0x02, 0x68, 0x82]);
        assert_eq!(&frame[16..20], &[0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_build_empty_payload() {
        let frame = FrameBuilder::new_uplink(0x12345678, 0, 1, vec![]).build();
        // MHDR(1) + DevAddr(4) + FCtrl(1) + FCnt(2) + MIC(4) = 12 (no FPort, no payload)
        assert_eq!(frame.len(), 12);
    }

    #[test]
    fn test_join_request_layout() {
        let id = SessionIdentity::new(ProviderProfile::Ttn, [0x42, 0x00]);
        let frame = join_request(&id);

        assert_eq!(frame.len(), 23);
        assert_eq!(frame[0], 0x00);
        assert_eq!(&frame[1..9], &[0x00; 8]);
        // DevEUI 70B3D57ED004A912 reversed
        assert_eq!(
            &frame[9..17],
            &[0x12, 0xA9, 0x04, 0xD0, 0x7E, 0xD5, 0xB3, 0x70]
        );
        assert_eq!(&frame[17..19], &[0x42, 0x00]);
        assert_eq!(&frame[19..23], &[0x00; 4]);
    }
}
