//! Solidity interface definitions for on-chain interactions.
//!
//! Contains the minimal ABI surface needed by the bridge:
//! - [`IOFT`] - LayerZero V2 OFT send/quote entry points
//! - [`IERC20`] - Balance, decimals and allowance of the underlying token

use alloy_sol_types::sol;

sol! {
    /// LayerZero V2 Omnichain Fungible Token interface.
    ///
    /// Only the functions used by the bridge are declared.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IOFT {
        struct SendParam {
            uint32 dstEid;
            bytes32 to;
            uint256 amountLD;
            uint256 minAmountLD;
            bytes extraOptions;
            bytes composeMsg;
            bytes oftCmd;
        }

        struct MessagingFee {
            uint256 nativeFee;
            uint256 lzTokenFee;
        }

        struct MessagingReceipt {
            bytes32 guid;
            uint64 nonce;
            MessagingFee fee;
        }

        struct OFTReceipt {
            uint256 amountSentLD;
            uint256 amountReceivedLD;
        }

        function token() external view returns (address);

        /// True for OFT adapters, which pull the underlying token with `transferFrom`.
        function approvalRequired() external view returns (bool);

        function quoteSend(SendParam calldata sendParam, bool payInLzToken)
            external
            view
            returns (MessagingFee memory);

        function send(SendParam calldata sendParam, MessagingFee calldata fee, address refundAddress)
            external
            payable
            returns (MessagingReceipt memory, OFTReceipt memory);
    }
}

sol! {
    /// Minimal ERC-20 interface for balance checks and approvals.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
