//! Wire-format types for a presentation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::Result;

/// Maximum byte length for `p`, and for each entry of `vcs`.
pub const MAX_OPAQUE_ID_LEN: usize = 256;

/// A parsed, schema-valid presentation. Ephemeral: constructed by
/// [`super::parse`], consumed by [`crate::verifier`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Presentation {
    /// Protocol version, e.g. `"1.0"`.
    pub v: String,
    /// Presentation id, opaque to the verifier.
    pub p: String,
    /// Holder DID, `did:aura:<network>:<id>`.
    pub h: String,
    /// Referenced VC ids, in presentation order.
    pub vcs: Vec<String>,
    /// Disclosure context: which boolean claims the holder is revealing.
    pub ctx: BTreeMap<String, bool>,
    /// Expiration, Unix seconds.
    pub exp: i64,
    /// Nonce, non-negative.
    pub n: u64,
    /// Holder's hex-encoded signature over the canonical hash of every
    /// other field.
    pub sig: String,
}

/// The subset of fields the holder's signature covers, in the exact shape
/// that gets canonicalized and hashed. Kept as a distinct type (rather than
/// `#[serde(skip)]` on `sig`) so the signed form is explicit at every call
/// site.
#[derive(Serialize)]
struct SignedFields<'a> {
    v: &'a str,
    p: &'a str,
    h: &'a str,
    vcs: &'a [String],
    ctx: &'a BTreeMap<String, bool>,
    exp: i64,
    n: u64,
}

impl Presentation {
    /// `sha256(canonicalJSON({v,p,h,vcs,ctx,exp,n}))` — the message the
    /// holder's `sig` signs.
    pub fn signing_hash(&self) -> Result<[u8; 32]> {
        let fields = SignedFields {
            v: &self.v,
            p: &self.p,
            h: &self.h,
            vcs: &self.vcs,
            ctx: &self.ctx,
            exp: self.exp,
            n: self.n,
        };
        crypto::hash_object(&fields)
    }

    /// `sig` decoded from hex.
    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        crypto::from_hex(&self.sig)
    }

    /// A stable key for the nonce tracker: `(holder, nonce)`.
    #[must_use]
    pub fn nonce_key(&self) -> String {
        format!("{}:{}", self.h, self.n)
    }
}
