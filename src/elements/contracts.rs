use alloy::sol;

sol! {
    #[sol(rpc)]
    contract TokenManager {
        function forward(bytes _evmScript) external;
    }

    contract Agent {
        function forward(bytes _evmScript) external;
    }

    #[sol(rpc)]
    contract Voting {
        event StartVote(uint256 indexed voteId, address indexed creator, string metadata);

        function newVote(bytes _executionScript, string _metadata) external returns (uint256 voteId);
    }

    contract Finance {
        function newImmediatePayment(address _token, address _receiver, uint256 _amount, string _reference) external;
    }

    contract BalancerRewardsManager {
        function set_rewards_limit_per_period(uint256 _new_limit) external;
        function set_allocations_limit(uint256 _new_allocations_limit) external;
    }
}
