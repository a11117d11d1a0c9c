//! # Message Payloads
//!
//! Every payload is a JSON object tagged with `object` and `action`. The table
//! below is the complete set of pairs a node decodes; [`Data::from_json`] is a
//! total function over it and rejects anything else with
//! [`DataError::UnhandledDataType`].

pub mod consensus;
pub mod election;
pub mod lao;
pub mod roll_call;
pub mod witness;

use crate::errors::DataError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use consensus::{
    ConsensusElect, ConsensusElectAccept, ConsensusFailure, ConsensusKey, ConsensusLearn,
    ConsensusPhase, LearnValue,
};
pub use election::{
    CastVote, ElectionEnd, ElectionKey, ElectionQuestion, ElectionResult, ElectionResultQuestion,
    ElectionSetup, ElectionVersion, OpenElection, QuestionResult, Vote, VoteChoice,
};
pub use lao::{CreateLao, GreetLao, PeerAddress, StateLao, UpdateLao};
pub use roll_call::{CloseRollCall, CreateRollCall, OpenRollCall};
pub use witness::WitnessMessageSignature;

const OBJECT: &str = "object";
const ACTION: &str = "action";

macro_rules! data_table {
    ($( $variant:ident($ty:ty) => ($object:literal, $action:literal), )*) => {
        /// Closed union of every payload a node understands.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Data {
            $( $variant($ty), )*
        }

        impl Data {
            /// The `object` tag.
            #[must_use]
            pub fn object(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $object, )*
                }
            }

            /// The `action` tag.
            #[must_use]
            pub fn action(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $action, )*
                }
            }

            fn payload_value(&self) -> Result<Value, serde_json::Error> {
                match self {
                    $( Self::$variant(payload) => serde_json::to_value(payload), )*
                }
            }

            fn from_tagged(object: &str, action: &str, value: Value) -> Result<Self, DataError> {
                match (object, action) {
                    $(
                        ($object, $action) => serde_json::from_value(value)
                            .map(Self::$variant)
                            .map_err(|e| DataError::InvalidJson(e.to_string())),
                    )*
                    _ => Err(DataError::UnhandledDataType {
                        object: object.to_string(),
                        action: action.to_string(),
                    }),
                }
            }
        }
    };
}

data_table! {
    CreateLao(CreateLao) => ("lao", "create"),
    UpdateLao(UpdateLao) => ("lao", "update_properties"),
    StateLao(StateLao) => ("lao", "state"),
    GreetLao(GreetLao) => ("lao", "greet"),
    CreateRollCall(CreateRollCall) => ("roll_call", "create"),
    OpenRollCall(OpenRollCall) => ("roll_call", "open"),
    ReopenRollCall(OpenRollCall) => ("roll_call", "reopen"),
    CloseRollCall(CloseRollCall) => ("roll_call", "close"),
    ElectionSetup(ElectionSetup) => ("election", "setup"),
    OpenElection(OpenElection) => ("election", "open"),
    CastVote(CastVote) => ("election", "cast_vote"),
    ElectionEnd(ElectionEnd) => ("election", "end"),
    ElectionResult(ElectionResult) => ("election", "result"),
    ElectionKey(ElectionKey) => ("election", "key"),
    WitnessMessageSignature(WitnessMessageSignature) => ("message", "witness"),
    ConsensusElect(ConsensusElect) => ("consensus", "elect"),
    ConsensusElectAccept(ConsensusElectAccept) => ("consensus", "elect_accept"),
    ConsensusLearn(ConsensusLearn) => ("consensus", "learn"),
    ConsensusFailure(ConsensusFailure) => ("consensus", "failure"),
    ConsensusPrepare(ConsensusPhase) => ("consensus", "prepare"),
    ConsensusPromise(ConsensusPhase) => ("consensus", "promise"),
    ConsensusPropose(ConsensusPhase) => ("consensus", "propose"),
    ConsensusAccept(ConsensusPhase) => ("consensus", "accept"),
}

impl Data {
    /// Decode from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DataError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| DataError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self, DataError> {
        let tag = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| DataError::InvalidJson(format!("missing `{name}` tag")))
        };
        let object = tag(OBJECT)?;
        let action = tag(ACTION)?;
        Self::from_tagged(&object, &action, value)
    }

    /// Encode to JSON bytes with `object` and `action` tags.
    pub fn to_json(&self) -> Result<Vec<u8>, DataError> {
        let value = self.to_value().map_err(|e| DataError::InvalidJson(e.to_string()))?;
        serde_json::to_vec(&value).map_err(|e| DataError::InvalidJson(e.to_string()))
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = self.payload_value()?;
        let map = value
            .as_object_mut()
            .ok_or_else(|| <serde_json::Error as serde::ser::Error>::custom("payload is not an object"))?;
        map.insert(OBJECT.to_string(), Value::from(self.object()));
        map.insert(ACTION.to_string(), Value::from(self.action()));
        Ok(value)
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(<D::Error as serde::de::Error>::custom)
    }
}
