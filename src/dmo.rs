//! Channel coding of the DMO synchronization block (SCH/S)
//!
//! Chains the stage primitives into the receive pipeline of EN 300 396-2, clause 8 —
//! descrambling, deinterleaving, depuncturing, Viterbi decoding, CRC verification and PDU
//! unpacking — and the matching transmit pipeline in reverse.

use crate::crc::{append_crc16, check_crc16, CRC_LEN};
use crate::interleaver::{Interleaver, INTERLEAVING_DEPTH};
use crate::pdu::{FieldSpec, PduRecord, PduSchema};
use crate::puncture::PuncturingPattern;
use crate::scramble::ScramblingSequence;
use crate::viterbi::ConvolutionalCode;
use crate::{hard_to_soft, Bit, Error};

/// Generator polynomials of the rate-1/4 mother code (EN 300 396-2, 8.2.3.1)
pub const MOTHER_CODE_POLYNOMIALS: [u32; 4] = [0b10011, 0b11101, 0b10111, 0b11011];

/// Number of scrambled (type-5) bits in a synchronization block
pub const SYNC_BLOCK_LEN: usize = 120;

/// Returns the rate-1/4 mother convolutional code.
///
/// # Errors
///
/// Never fails for the built-in polynomials; the `Result` mirrors [`ConvolutionalCode::new`].
pub fn mother_code() -> Result<ConvolutionalCode, Error> {
    ConvolutionalCode::new(&MOTHER_CODE_POLYNOMIALS)
}

/// Returns the field table of the DMAC-SYNC PDU on SCH/S (EN 300 396-3, 9.1.1), 60 bits in
/// total.
///
/// # Errors
///
/// Never fails for the built-in table; the `Result` mirrors [`PduSchema::new`].
pub fn dmac_sync_sch_s() -> Result<PduSchema, Error> {
    PduSchema::new(vec![
        FieldSpec::uint("System code", 4, 0, false),
        FieldSpec::uint("SYNC PDU type", 2, 0, true),
        FieldSpec::uint("Communication type", 2, 0, false),
        FieldSpec::uint("Master/slave link flag", 1, 0, false),
        FieldSpec::uint("Gateway generated flag", 1, 0, false),
        FieldSpec::uint("A/B channel usage", 2, 0, false),
        FieldSpec::uint("Slot number", 2, 0, false),
        FieldSpec::uint("Frame number", 5, 0, false),
        FieldSpec::uint("Encryption state", 2, 0, false),
        FieldSpec::bits("Reserved", 39),
    ])
}

/// Result of decoding one synchronization block
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SyncBlock {
    /// Decoded PDU fields
    pub pdu: PduRecord,
    /// Whether the block CRC verified
    pub crc_ok: bool,
    /// The decoded (type-1) bits, PDU payload followed by the 16 CRC bits
    pub type1_bits: Vec<Bit>,
}

/// Codec for the SCH/S logical channel of one DM cell
///
/// Holds the scrambling sequence, interleaver, puncturing pattern, mother code and PDU schema
/// precomputed for the cell's colour code, so per-burst decoding allocates only its working
/// buffers. The codec is immutable and can be shared across threads.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SyncBlockCodec {
    scrambling: ScramblingSequence,
    interleaver: Interleaver,
    puncturing: PuncturingPattern,
    code: ConvolutionalCode,
    schema: PduSchema,
}

impl SyncBlockCodec {
    /// Returns the codec for a given 30-bit DM colour code.
    ///
    /// # Errors
    ///
    /// Returns an error if `colour_code` is not exactly 30 bits long.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetra_lmac::{dmo::SyncBlockCodec, Bit};
    ///
    /// let codec = SyncBlockCodec::new(&[Bit::Zero; 30])?;
    /// assert_eq!(codec.type1_len(), 76);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(colour_code: &[Bit]) -> Result<Self, Error> {
        Ok(Self {
            scrambling: ScramblingSequence::new(SYNC_BLOCK_LEN, colour_code)?,
            interleaver: Interleaver::block(SYNC_BLOCK_LEN, INTERLEAVING_DEPTH)?,
            puncturing: PuncturingPattern::new(SYNC_BLOCK_LEN, 2, 3)?,
            code: mother_code()?,
            schema: dmac_sync_sch_s()?,
        })
    }

    /// Returns the PDU schema of the channel.
    #[must_use]
    pub fn schema(&self) -> &PduSchema {
        &self.schema
    }

    /// Returns the decoded (type-1) block length: PDU payload plus CRC.
    #[must_use]
    pub fn type1_len(&self) -> usize {
        self.schema.num_bits() + CRC_LEN
    }

    /// Decodes one received synchronization block from soft bits.
    ///
    /// Decoding is best-effort: a corrupted block still yields a [`SyncBlock`], with `crc_ok`
    /// cleared and the PDU record marked invalid, so callers can log what was received.
    ///
    /// # Errors
    ///
    /// Returns an error only if `type5_softbits` is not exactly 120 soft bits.
    pub fn decode(&self, type5_softbits: &[u8]) -> Result<SyncBlock, Error> {
        let type4 = self.scrambling.scramble_soft(type5_softbits)?;
        let type3 = self.interleaver.deinterleave(&type4)?;
        let type2 = self.puncturing.depuncture(&type3)?;
        let type1 = self.code.decode_soft(&type2, self.type1_len())?;
        let crc_ok = check_crc16(&type1)?;
        let mut pdu = self.schema.unpack(&type1[.. self.schema.num_bits()])?;
        if !crc_ok {
            pdu.invalidate();
        }
        Ok(SyncBlock {
            pdu,
            crc_ok,
            type1_bits: type1,
        })
    }

    /// Decodes one received synchronization block from hard bits, treating each bit as fully
    /// confident.
    ///
    /// # Errors
    ///
    /// Returns an error only if `type5_bits` is not exactly 120 bits.
    pub fn decode_hard(&self, type5_bits: &[Bit]) -> Result<SyncBlock, Error> {
        self.decode(&hard_to_soft(type5_bits))
    }

    /// Encodes a PDU record into the 120 scrambled (type-5) bits of a synchronization block.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not pack against the channel's schema.
    pub fn encode(&self, pdu: &PduRecord) -> Result<Vec<Bit>, Error> {
        let type1 = append_crc16(&self.schema.pack(pdu)?);
        let type2 = self.code.encode(&type1);
        let type3 = self.puncturing.puncture(&type2)?;
        let type4 = self.interleaver.interleave(&type3)?;
        self.scrambling.scramble(&type4)
    }
}
