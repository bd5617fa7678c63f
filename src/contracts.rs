//! Contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Only the read-only
//! surface the verifier needs is declared.

use alloy::sol;

sol! {
    /// Linea TokenBridge (same interface deployed on L1 and L2)
    #[sol(rpc)]
    contract TokenBridge {
        /// Bridged counterpart of a native token, zero if none, or the
        /// reserved-status marker if the slot is blocked
        function nativeToBridgedToken(uint256 chainId, address nativeToken) external view returns (address);
    }

    /// Standard ERC20 metadata
    #[sol(rpc)]
    contract ERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }

    /// Legacy ERC20 metadata returning fixed-width names (e.g. MKR, SAI)
    #[sol(rpc)]
    contract ERC20Bytes32 {
        function name() external view returns (bytes32);
        function symbol() external view returns (bytes32);
        function decimals() external view returns (uint8);
    }
}
