//! Bridge contract ABI definitions
//!
//! Uses alloy's sol! macro to generate call encoders/decoders for the
//! externally deployed contracts. Calls are encoded here and sent through a
//! [`crate::wallet::WalletClient`], so no provider is bound to the bindings.

use alloy::sol;

sol! {
    /// LayerLeap native bridge (LayerZero-backed)
    interface ILayerLeapBridge {
        /// Bridge `msg.value - fee` of native ETH to `toAddress` on `dstChainId`
        function bridgeNative(uint16 dstChainId, bytes32 toAddress, bytes adapterParams) external payable;

        /// Quote the LayerZero messaging fee for a bridge call
        function estimateFee(uint16 dstChainId, bytes32 toAddress, uint256 amount, bytes adapterParams) external view returns (uint256 nativeFee, uint256 zroFee);

        /// Translate an EVM chain ID to its LayerZero ID
        function chainToLzId(uint256 chainId) external view returns (uint16);

        /// Check whether the bridge has a route to an EVM chain
        function isChainSupported(uint256 chainId) external view returns (bool);

        /// All EVM chain IDs the bridge routes to
        function getSupportedChains() external view returns (uint256[]);
    }

    /// LayerZero v1 endpoint
    interface ILayerZeroEndpoint {
        function send(
            uint16 _dstChainId,
            bytes _destination,
            bytes _payload,
            address _refundAddress,
            address _zroPaymentAddress,
            bytes _adapterParams
        ) external payable;

        function estimateFees(
            uint16 _dstChainId,
            address _userApplication,
            bytes _payload,
            bool _payInZRO,
            bytes _adapterParam
        ) external view returns (uint256 nativeFee, uint256 zroFee);
    }

    /// Hyperlane v3 mailbox
    interface IMailbox {
        function dispatch(uint32 destinationDomain, bytes32 recipientAddress, bytes messageBody) external payable returns (bytes32 messageId);

        function quoteDispatch(uint32 destinationDomain, bytes32 recipientAddress, bytes messageBody) external view returns (uint256 fee);
    }
}
