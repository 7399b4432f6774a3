//! Hash and signature operations.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use onyx_cryptography::{hash, ECDsa};

/// Registers the cryptographic operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::SHA1, sha1);
    jump_table.register(OpCode::SHA256, sha256);
    jump_table.register(OpCode::HASH160, hash160);
    jump_table.register(OpCode::HASH256, hash256);
    jump_table.register(OpCode::VERIFY, verify);
}

fn digest(engine: &mut ExecutionEngine, f: impl FnOnce(&[u8]) -> Vec<u8>) -> VmResult<()> {
    let data = engine.evaluation_stack_mut().pop_bytes()?;
    engine.push(StackItem::from_bytes(f(&data)))
}

/// Implements the SHA1 operation.
fn sha1(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    digest(engine, |data| hash::sha1(data).to_vec())
}

/// Implements the SHA256 operation.
fn sha256(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    digest(engine, |data| hash::sha256(data).to_vec())
}

/// Implements the HASH160 operation.
fn hash160(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    digest(engine, |data| hash::hash160(data).to_vec())
}

/// Implements the HASH256 operation.
fn hash256(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    digest(engine, |data| hash::hash256(data).to_vec())
}

/// Implements the VERIFY operation.
///
/// Pops the message, then the signature, then the public key. A malformed
/// key faults; a signature that does not verify pushes `false`.
fn verify(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let message = engine.evaluation_stack_mut().pop_bytes()?;
    let signature = engine.evaluation_stack_mut().pop_bytes()?;
    let public_key = engine.evaluation_stack_mut().pop_bytes()?;
    let valid = ECDsa::verify_encoded(&public_key, &message, &signature)
        .ok_or(VmError::InvalidPublicKey)?;
    engine.push(StackItem::Boolean(valid))
}

#[cfg(test)]
mod tests {
    use crate::{ExecutionEngine, OpCode, StackItem, VMState};
    use onyx_cryptography::KeyPair;

    fn run_with(items: Vec<StackItem>, op: OpCode) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        for item in items {
            engine.evaluation_stack_mut().push(item).unwrap();
        }
        engine.load_script(vec![op as u8]).unwrap();
        engine.execute();
        engine
    }

    #[test]
    fn test_hash_lengths() {
        for (op, len) in [
            (OpCode::SHA1, 20),
            (OpCode::SHA256, 32),
            (OpCode::HASH160, 20),
            (OpCode::HASH256, 32),
        ] {
            let engine = run_with(vec![StackItem::from_bytes(b"abc".to_vec())], op);
            assert_eq!(engine.result().unwrap().as_bytes().unwrap().len(), len);
        }
    }

    #[test]
    fn test_sha256_vector() {
        let engine = run_with(vec![StackItem::from_bytes(b"abc".to_vec())], OpCode::SHA256);
        assert_eq!(
            engine.result().unwrap().as_bytes().unwrap(),
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad").unwrap()
        );
    }

    #[test]
    fn test_verify() {
        let key = KeyPair::generate();
        let message = b"block header".to_vec();
        let signature = key.sign(&message).to_vec();
        let public_key = key.public_key().to_array().to_vec();

        let stack = |public_key: Vec<u8>, signature: Vec<u8>, message: Vec<u8>| {
            vec![
                StackItem::from_bytes(public_key),
                StackItem::from_bytes(signature),
                StackItem::from_bytes(message),
            ]
        };

        let engine = run_with(
            stack(public_key.clone(), signature.clone(), message.clone()),
            OpCode::VERIFY,
        );
        assert_eq!(engine.result(), Some(&StackItem::Boolean(true)));

        let engine = run_with(
            stack(public_key, signature.clone(), b"other".to_vec()),
            OpCode::VERIFY,
        );
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(engine.result(), Some(&StackItem::Boolean(false)));

        let engine = run_with(stack(vec![0x02; 5], signature, message), OpCode::VERIFY);
        assert_eq!(engine.state(), VMState::FAULT);
    }
}
