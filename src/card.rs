//! Card-wide identity and capability configuration (`§1.1`, ADDED).
//!
//! Gathers the card-identity bytes, capability flags, and supported key-size ranges into one
//! struct built once at session start, the way [`SlaveSecurityManagerBuilder`] gathers IO
//! capability and encryption-key-size bounds before producing a `SlaveSecurityManager`.
//!
//! [`SlaveSecurityManagerBuilder`]: https://docs.rs/bo-tie

/// Card-wide configuration, constructed once and shared read-only by the dispatcher for the
/// lifetime of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardConfig {
    card_id: [u8; 20],
    capabilities: [u8; 11],
    rsa_modulus_min_bits: u16,
    rsa_modulus_max_bits: u16,
}

const DEFAULT_RSA_MIN_BITS: u16 = 512;
const DEFAULT_RSA_MAX_BITS: u16 = 2048;

impl Default for CardConfig {
    fn default() -> Self {
        CardConfig {
            card_id: [0u8; 20],
            capabilities: [0u8; 11],
            rsa_modulus_min_bits: DEFAULT_RSA_MIN_BITS,
            rsa_modulus_max_bits: DEFAULT_RSA_MAX_BITS,
        }
    }
}

impl CardConfig {
    pub fn builder() -> CardConfigBuilder {
        CardConfigBuilder::new()
    }

    pub fn card_id(&self) -> [u8; 20] {
        self.card_id
    }

    pub fn capabilities(&self) -> [u8; 11] {
        self.capabilities
    }

    /// Validates an RSA modulus size against `§4.8`: a multiple of 64 bits within the card's
    /// configured range.
    pub fn rsa_modulus_size_is_valid(&self, bits: u16) -> bool {
        bits >= self.rsa_modulus_min_bits
            && bits <= self.rsa_modulus_max_bits
            && bits % 64 == 0
    }
}

/// Builder for [`CardConfig`], mirroring `SlaveSecurityManagerBuilder`'s `set_*` chain.
pub struct CardConfigBuilder {
    card_id: [u8; 20],
    capabilities: [u8; 11],
    rsa_modulus_min_bits: u16,
    rsa_modulus_max_bits: u16,
}

impl CardConfigBuilder {
    fn new() -> Self {
        let defaults = CardConfig::default();
        CardConfigBuilder {
            card_id: defaults.card_id,
            capabilities: defaults.capabilities,
            rsa_modulus_min_bits: defaults.rsa_modulus_min_bits,
            rsa_modulus_max_bits: defaults.rsa_modulus_max_bits,
        }
    }

    pub fn card_id(mut self, id: [u8; 20]) -> Self {
        self.card_id = id;
        self
    }

    pub fn capabilities(mut self, capabilities: [u8; 11]) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn rsa_modulus_range(mut self, min_bits: u16, max_bits: u16) -> Result<Self, &'static str> {
        if min_bits > max_bits || min_bits % 64 != 0 || max_bits % 64 != 0 {
            return Err("RSA modulus range must be 64-bit-aligned with min <= max");
        }
        self.rsa_modulus_min_bits = min_bits;
        self.rsa_modulus_max_bits = max_bits;
        Ok(self)
    }

    pub fn build(self) -> CardConfig {
        CardConfig {
            card_id: self.card_id,
            capabilities: self.capabilities,
            rsa_modulus_min_bits: self.rsa_modulus_min_bits,
            rsa_modulus_max_bits: self.rsa_modulus_max_bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_accepts_1024_and_2048() {
        let config = CardConfig::default();
        assert!(config.rsa_modulus_size_is_valid(1024));
        assert!(config.rsa_modulus_size_is_valid(2048));
        assert!(!config.rsa_modulus_size_is_valid(2049));
        assert!(!config.rsa_modulus_size_is_valid(256));
    }

    #[test]
    fn builder_rejects_misaligned_range() {
        assert!(CardConfig::builder().rsa_modulus_range(500, 1024).is_err());
    }

    #[test]
    fn builder_roundtrips_card_id() {
        let id = [0x42u8; 20];
        let config = CardConfig::builder().card_id(id).build();
        assert_eq!(config.card_id(), id);
    }
}
