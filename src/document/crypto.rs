/*!
 * Password-protected Office documents.
 *
 * An encrypted .docx is not a zip package but an OLE compound file holding
 * an `EncryptionInfo` stream (how the key is derived) and an
 * `EncryptedPackage` stream (the AES-encrypted zip). Only ECMA-376 agile
 * encryption is opened here.
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use log::debug;
use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::errors::DocumentError;

/// Signature of an OLE compound file
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const ENCRYPTION_INFO: &str = "/EncryptionInfo";
const ENCRYPTED_PACKAGE: &str = "/EncryptedPackage";

const SEGMENT_LENGTH: usize = 4096;
const AES_BLOCK_SIZE: usize = 16;
const MAX_SPIN_COUNT: u32 = 10_000_000;

const VERIFIER_INPUT_BLOCK: [u8; 8] = [0xfe, 0xa7, 0xd2, 0x76, 0x3b, 0x4b, 0x9e, 0x79];
const VERIFIER_VALUE_BLOCK: [u8; 8] = [0xd7, 0xaa, 0x0f, 0x6d, 0x30, 0x61, 0x34, 0x4e];
const KEY_VALUE_BLOCK: [u8; 8] = [0x14, 0x6e, 0x0b, 0xe7, 0xab, 0xac, 0xd0, 0xd6];

/// Hash algorithms accepted in agile encryption descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn parse(name: &str) -> Result<Self, DocumentError> {
        match name.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            other => Err(DocumentError::UnsupportedEncryption(format!(
                "hash algorithm {} is not supported",
                other
            ))),
        }
    }

    /// Digest length in bytes
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Hash the concatenation of `parts`
    pub fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().to_vec()
        }

        match self {
            Self::Sha256 => run::<Sha256>(parts),
            Self::Sha384 => run::<Sha384>(parts),
            Self::Sha512 => run::<Sha512>(parts),
        }
    }
}

/// Cipher parameters shared by `keyData` and `encryptedKey`
#[derive(Debug, Clone)]
struct CipherParams {
    salt: Vec<u8>,
    salt_size: usize,
    block_size: usize,
    key_bits: usize,
    hash_size: usize,
    hash: HashAlgorithm,
}

/// Password key encryptor of an agile descriptor
#[derive(Debug, Clone)]
struct PasswordKey {
    params: CipherParams,
    spin_count: u32,
    verifier_input: Vec<u8>,
    verifier_value: Vec<u8>,
    key_value: Vec<u8>,
}

#[derive(Debug, Clone)]
struct AgileInfo {
    key_data: CipherParams,
    password_key: PasswordKey,
}

/// Whether the bytes start with the OLE compound file signature
pub fn is_compound_file(bytes: &[u8]) -> bool {
    bytes.len() >= OLE_MAGIC.len() && bytes[..OLE_MAGIC.len()] == OLE_MAGIC
}

/// Whether the bytes are an encrypted Office package
pub fn is_encrypted(bytes: &[u8]) -> bool {
    if !is_compound_file(bytes) {
        return false;
    }
    match cfb::CompoundFile::open(Cursor::new(bytes)) {
        Ok(compound) => compound.is_stream(ENCRYPTION_INFO),
        Err(e) => {
            debug!("Compound file could not be opened: {}", e);
            false
        }
    }
}

/// Decrypt an agile-encrypted package and return the inner zip bytes
pub fn decrypt(bytes: &[u8], password: &str) -> Result<Vec<u8>, DocumentError> {
    let mut compound = cfb::CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| DocumentError::ReadFailed(format!("not a compound file: {}", e)))?;

    let info = read_stream(&mut compound, ENCRYPTION_INFO)?;
    let agile = parse_encryption_info(&info)?;
    debug!(
        "Agile encryption: {:?}, {} bit key, spin count {}",
        agile.key_data.hash, agile.key_data.key_bits, agile.password_key.spin_count
    );

    let secret = unlock_secret_key(&agile.password_key, password)?;

    let package = read_stream(&mut compound, ENCRYPTED_PACKAGE)?;
    decrypt_package(&agile.key_data, &secret, &package)
}

fn read_stream(
    compound: &mut cfb::CompoundFile<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, DocumentError> {
    let mut stream = compound
        .open_stream(name)
        .map_err(|e| DocumentError::ReadFailed(format!("missing {} stream: {}", name, e)))?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

fn parse_encryption_info(info: &[u8]) -> Result<AgileInfo, DocumentError> {
    if info.len() < 8 {
        return Err(DocumentError::ReadFailed(
            "EncryptionInfo stream is truncated".to_string(),
        ));
    }
    let major = u16::from_le_bytes([info[0], info[1]]);
    let minor = u16::from_le_bytes([info[2], info[3]]);

    match (major, minor) {
        (4, 4) => {}
        (2..=4, 2) => {
            return Err(DocumentError::UnsupportedEncryption(
                "standard encryption is not supported, only agile".to_string(),
            ));
        }
        _ => {
            return Err(DocumentError::UnsupportedEncryption(format!(
                "encryption version {}.{}",
                major, minor
            )));
        }
    }

    let xml = std::str::from_utf8(&info[8..])
        .map_err(|e| DocumentError::ReadFailed(format!("EncryptionInfo is not UTF-8: {}", e)))?;
    parse_agile_xml(xml)
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>, DocumentError> {
    let mut map = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| DocumentError::ReadFailed(format!("bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::ReadFailed(format!("bad attribute value: {}", e)))?;
        map.insert(key, value.into_owned());
    }
    Ok(map)
}

fn parse_agile_xml(xml: &str) -> Result<AgileInfo, DocumentError> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut key_data = None;
    let mut encrypted_key = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"keyData" => key_data = Some(attributes(&e)?),
                b"encryptedKey" => encrypted_key = Some(attributes(&e)?),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::ReadFailed(format!(
                    "malformed EncryptionInfo: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    let key_data = key_data
        .ok_or_else(|| DocumentError::ReadFailed("EncryptionInfo has no keyData".to_string()))?;
    let encrypted_key = encrypted_key.ok_or_else(|| {
        DocumentError::UnsupportedEncryption("no password key encryptor".to_string())
    })?;

    let password_key = PasswordKey {
        params: cipher_params(&encrypted_key)?,
        spin_count: number(&encrypted_key, "spinCount")?,
        verifier_input: base64_attr(&encrypted_key, "encryptedVerifierHashInput")?,
        verifier_value: base64_attr(&encrypted_key, "encryptedVerifierHashValue")?,
        key_value: base64_attr(&encrypted_key, "encryptedKeyValue")?,
    };
    if password_key.spin_count > MAX_SPIN_COUNT {
        return Err(DocumentError::UnsupportedEncryption(format!(
            "spin count {} is too large",
            password_key.spin_count
        )));
    }

    Ok(AgileInfo {
        key_data: cipher_params(&key_data)?,
        password_key,
    })
}

fn required<'a>(attrs: &'a HashMap<String, String>, name: &str) -> Result<&'a str, DocumentError> {
    attrs
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| DocumentError::ReadFailed(format!("EncryptionInfo lacks {}", name)))
}

fn number<T: std::str::FromStr>(attrs: &HashMap<String, String>, name: &str) -> Result<T, DocumentError> {
    required(attrs, name)?
        .trim()
        .parse()
        .map_err(|_| DocumentError::ReadFailed(format!("EncryptionInfo has a bad {}", name)))
}

fn base64_attr(attrs: &HashMap<String, String>, name: &str) -> Result<Vec<u8>, DocumentError> {
    BASE64
        .decode(required(attrs, name)?.trim())
        .map_err(|e| DocumentError::ReadFailed(format!("{} is not base64: {}", name, e)))
}

fn cipher_params(attrs: &HashMap<String, String>) -> Result<CipherParams, DocumentError> {
    let cipher = required(attrs, "cipherAlgorithm")?;
    if !cipher.eq_ignore_ascii_case("AES") {
        return Err(DocumentError::UnsupportedEncryption(format!("cipher {}", cipher)));
    }
    let chaining = required(attrs, "cipherChaining")?;
    if chaining != "ChainingModeCBC" {
        return Err(DocumentError::UnsupportedEncryption(format!("chaining {}", chaining)));
    }

    let params = CipherParams {
        salt: base64_attr(attrs, "saltValue")?,
        salt_size: number(attrs, "saltSize")?,
        block_size: number(attrs, "blockSize")?,
        key_bits: number(attrs, "keyBits")?,
        hash_size: number(attrs, "hashSize")?,
        hash: HashAlgorithm::parse(required(attrs, "hashAlgorithm")?)?,
    };
    check_sizes(&params)?;
    Ok(params)
}

/// Descriptor sizes drive later allocations; accept only values AES and the
/// declared hash can have.
fn check_sizes(params: &CipherParams) -> Result<(), DocumentError> {
    if params.block_size != AES_BLOCK_SIZE {
        return Err(DocumentError::UnsupportedEncryption(format!(
            "block size {}",
            params.block_size
        )));
    }
    if !matches!(params.key_bits, 128 | 192 | 256) {
        return Err(DocumentError::UnsupportedEncryption(format!(
            "{} bit AES keys",
            params.key_bits
        )));
    }
    if params.hash_size != params.hash.output_len() {
        return Err(DocumentError::ReadFailed(format!(
            "hash size {} does not match {:?}",
            params.hash_size, params.hash
        )));
    }
    if params.salt_size == 0 || params.salt_size > params.salt.len() {
        return Err(DocumentError::ReadFailed(format!(
            "salt size {} does not match a {} byte salt",
            params.salt_size,
            params.salt.len()
        )));
    }
    Ok(())
}

/// Truncate or pad with 0x36 to exactly `len` bytes
fn fit(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    bytes.resize(len, 0x36);
    bytes
}

/// Iterated password hash: H(salt + password), then `spin_count` rounds of
/// H(round + previous)
pub fn hash_password(hash: HashAlgorithm, salt: &[u8], password: &str, spin_count: u32) -> Vec<u8> {
    let password: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut h = hash.digest(&[salt, password.as_slice()]);
    for round in 0..spin_count {
        h = hash.digest(&[&round.to_le_bytes()[..], h.as_slice()]);
    }
    h
}

fn derive_key(hash: HashAlgorithm, hashed_password: &[u8], block: &[u8], key_len: usize) -> Vec<u8> {
    fit(hash.digest(&[hashed_password, block]), key_len)
}

fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, DocumentError> {
    macro_rules! run {
        ($cipher:ty) => {{
            let mut buf = data.to_vec();
            cbc::Decryptor::<$cipher>::new_from_slices(key, iv)
                .map_err(|e| DocumentError::ReadFailed(format!("bad key or IV: {}", e)))?
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(|e| DocumentError::ReadFailed(format!("decryption failed: {}", e)))?;
            Ok(buf)
        }};
    }

    if data.len() % AES_BLOCK_SIZE != 0 {
        return Err(DocumentError::ReadFailed(format!(
            "ciphertext of {} bytes is not block aligned",
            data.len()
        )));
    }

    match key.len() {
        16 => run!(aes::Aes128),
        24 => run!(aes::Aes192),
        32 => run!(aes::Aes256),
        n => Err(DocumentError::UnsupportedEncryption(format!(
            "{} bit AES keys",
            n * 8
        ))),
    }
}

fn unlock_secret_key(key: &PasswordKey, password: &str) -> Result<Vec<u8>, DocumentError> {
    let params = &key.params;
    let hash = params.hash;
    let key_len = params.key_bits / 8;
    let iv = fit(params.salt.clone(), params.block_size);
    let hashed = hash_password(hash, &params.salt, password, key.spin_count);

    let input_key = derive_key(hash, &hashed, &VERIFIER_INPUT_BLOCK, key_len);
    let mut verifier = aes_cbc_decrypt(&input_key, &iv, &key.verifier_input)?;
    verifier.truncate(params.salt_size);

    let value_key = derive_key(hash, &hashed, &VERIFIER_VALUE_BLOCK, key_len);
    let mut expected = aes_cbc_decrypt(&value_key, &iv, &key.verifier_value)?;
    expected.truncate(params.hash_size);

    if hash.digest(&[verifier.as_slice()]) != expected {
        return Err(DocumentError::WrongPassword(
            "password verifier does not match".to_string(),
        ));
    }

    let secret_key = derive_key(hash, &hashed, &KEY_VALUE_BLOCK, key_len);
    let mut secret = aes_cbc_decrypt(&secret_key, &iv, &key.key_value)?;
    secret.truncate(key_len);
    Ok(secret)
}

fn decrypt_package(key_data: &CipherParams, secret: &[u8], package: &[u8]) -> Result<Vec<u8>, DocumentError> {
    if package.len() < 8 {
        return Err(DocumentError::ReadFailed(
            "EncryptedPackage stream is truncated".to_string(),
        ));
    }
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&package[..8]);
    let size = u64::from_le_bytes(size_bytes) as usize;

    let mut plain = Vec::with_capacity(package.len() - 8);
    for (index, segment) in package[8..].chunks(SEGMENT_LENGTH).enumerate() {
        let index = index as u32;
        let iv = fit(
            key_data.hash.digest(&[key_data.salt.as_slice(), &index.to_le_bytes()[..]]),
            key_data.block_size,
        );
        plain.extend(aes_cbc_decrypt(secret, &iv, segment)?);
    }

    if plain.len() < size {
        return Err(DocumentError::ReadFailed(format!(
            "decrypted package is {} bytes, expected {}",
            plain.len(),
            size
        )));
    }
    plain.truncate(size);
    debug!("Decrypted package of {} bytes", size);
    Ok(plain)
}
